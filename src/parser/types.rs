//! Per-file parse records.
//!
//! A [`SourceFile`] is the unit the parser hands to the dependency analyzer
//! and the unit the cache stores. It is owned by the scan that produced it
//! and replaced wholesale when its file is re-parsed.

use serde::{Deserialize, Serialize};

/// How a method is bound to its class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Instance,
    Static,
    Class,
}

/// The flavor of an import statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import pkg.mod`, `import { x } from "lib"`, `use crate::x`.
    Absolute,
    /// `from .sibling import x`, `import "./util"`, `require_relative`.
    Relative,
    /// CommonJS / Ruby `require("...")`.
    Require,
    /// `import("...")` and other runtime-evaluated forms.
    Dynamic,
}

/// A single import statement as written in the source.
///
/// The specifier is kept raw; mapping it to a project file is the
/// analyzer's job, not the parser's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub raw_specifier: String,
    pub kind: ImportKind,
    /// Imported names; `"*"` marks a wildcard import.
    pub imported_items: Vec<String>,
}

/// A function or method definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    /// 1-based, inclusive.
    pub line_start: usize,
    /// 1-based, inclusive.
    pub line_end: usize,
    /// Parameter names, variadic markers kept (`*args`, `**kwargs`, `...rest`).
    pub parameters: Vec<String>,
    pub decorators: Vec<String>,
    pub is_async: bool,
    /// Bare callee names seen in the body, unresolved, first occurrence order.
    pub calls: Vec<String>,
    /// Set only for methods owned by a [`Class`].
    pub method_kind: Option<MethodKind>,
}

impl Function {
    pub fn new(name: impl Into<String>, line_start: usize, line_end: usize) -> Self {
        Self {
            name: name.into(),
            line_start,
            line_end,
            parameters: Vec::new(),
            decorators: Vec::new(),
            is_async: false,
            calls: Vec::new(),
            method_kind: None,
        }
    }
}

/// A class (or struct-like) definition with its methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub name: String,
    pub line_start: usize,
    pub line_end: usize,
    /// Base classes / extended types, as written.
    pub bases: Vec<String>,
    pub methods: Vec<Function>,
}

impl Class {
    pub fn new(name: impl Into<String>, line_start: usize, line_end: usize) -> Self {
        Self {
            name: name.into(),
            line_start,
            line_end,
            bases: Vec::new(),
            methods: Vec::new(),
        }
    }
}

/// Everything extracted from one file.
///
/// Identity is `id`: the normalized project-relative path (forward slashes,
/// no leading slash). A file that failed to parse still yields a record with
/// `parse_ok = false` and empty structure so it participates in the graph
/// as a node with no edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFile {
    pub id: String,
    pub language: super::Language,
    pub size_bytes: u64,
    pub line_count: usize,
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    pub imports: Vec<ImportStatement>,
    pub parse_ok: bool,
}

impl SourceFile {
    /// An empty record for files we cannot extract structure from.
    pub fn empty(id: impl Into<String>, language: super::Language, size_bytes: u64, line_count: usize, parse_ok: bool) -> Self {
        Self {
            id: id.into(),
            language,
            size_bytes,
            line_count,
            functions: Vec::new(),
            classes: Vec::new(),
            imports: Vec::new(),
            parse_ok,
        }
    }

    /// Total functions including methods.
    pub fn function_count(&self) -> usize {
        self.functions.len() + self.classes.iter().map(|c| c.methods.len()).sum::<usize>()
    }
}
