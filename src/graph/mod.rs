//! Dependency graph module — the analytical backbone of codeatlas.
//!
//! Provides the alias table, the dependency analyzer, and the derived
//! graph types it produces.

pub mod alias;
pub mod analyzer;
pub mod types;

pub use alias::{AliasRule, AliasTable};
pub use analyzer::{DependencyAnalyzer, DEFAULT_ENTRY_FILES};
pub use types::{
    CallEdge, DeadCode, DependencyGraph, FileDependencies, FunctionCallGraph, FunctionNode,
    GraphData, GraphKind, ImportEdge, NodeStats,
};
