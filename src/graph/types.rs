//! Derived graph types.
//!
//! These are computed from the in-memory file table and never stored on the
//! parse records themselves. Node maps are ordered (`BTreeMap`) so output
//! and tie-breaking stay deterministic by lexical file id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::parser::Language;

/// An import resolved (or not) against the project's file set.
///
/// `target_id = None` means external or unresolvable; external edges never
/// carry a dangling id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub source_id: String,
    pub target_id: Option<String>,
    pub raw_specifier: String,
    pub imported_items: Vec<String>,
}

impl ImportEdge {
    pub fn is_resolved(&self) -> bool {
        self.target_id.is_some()
    }
}

/// Per-file node statistics in the file-level graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub size_bytes: u64,
    pub line_count: usize,
    pub language: Language,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Normalized in-degree in [0, 1]; 1.0 means imported by every other file.
    pub centrality: f64,
}

/// The file-level dependency graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: BTreeMap<String, NodeStats>,
    pub edges: Vec<ImportEdge>,
}

impl DependencyGraph {
    /// Resolved edges only; external imports stay in `edges` for diagnostics.
    pub fn resolved_edges(&self) -> impl Iterator<Item = &ImportEdge> {
        self.edges.iter().filter(|e| e.is_resolved())
    }
}

/// A node in the function-level call graph, keyed `"{file_id}#{name}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionNode {
    /// Display name; methods are `Class.method`.
    pub name: String,
    pub file_id: String,
    pub line_start: usize,
    pub line_end: usize,
    pub parameters: Vec<String>,
}

/// An edge in the function-level call graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEdge {
    pub caller: String,
    pub callee: String,
}

/// The function-level call graph.
///
/// Edges exist only where the callee name resolves unambiguously
/// project-wide; ambiguous names are dropped, not guessed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionCallGraph {
    pub nodes: BTreeMap<String, FunctionNode>,
    pub edges: Vec<CallEdge>,
}

/// Files and functions with no resolvable inbound references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadCode {
    pub files: Vec<String>,
    /// Function graph node keys.
    pub functions: Vec<String>,
}

/// Resolved dependency lists for a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDependencies {
    pub imports: Vec<String>,
    pub imported_by: Vec<String>,
}

/// Which derived graph a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    File,
    Function,
}

/// A derived graph, either flavor.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GraphData {
    File(DependencyGraph),
    Function(FunctionCallGraph),
}
