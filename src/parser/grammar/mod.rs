//! Grammar-strategy extraction: real syntax trees via tree-sitter.
//!
//! Each language module walks the AST directly. This is the high-fidelity
//! path; languages without a bundled grammar fall back to the heuristic
//! scanner instead.

pub mod javascript;
pub mod python;
pub mod rust;

use tree_sitter::Node;

use super::language::Language;
use super::types::{Class, Function, ImportStatement};

/// Structure pulled out of a single file.
#[derive(Debug, Default)]
pub struct Extraction {
    pub functions: Vec<Function>,
    pub classes: Vec<Class>,
    pub imports: Vec<ImportStatement>,
}

/// Parse `source` with the language's grammar and extract structure.
///
/// Returns `None` when the grammar rejects the input (no tree, or a tree
/// whose root contains syntax errors); the caller records the file with
/// `parse_ok = false` and empty structure.
pub fn extract(language: Language, source: &str) -> Option<Extraction> {
    let grammar = language.grammar()?;
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&grammar).ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }

    let src = source.as_bytes();
    let extraction = match language {
        Language::Python => python::extract(&root, src),
        Language::Rust => rust::extract(&root, src),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            javascript::extract(&root, src)
        }
        _ => Extraction::default(),
    };
    Some(extraction)
}

// ─── Shared walking helpers ─────────────────────────────────────────────

pub(crate) fn text<'a>(node: &Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

pub(crate) fn line_range(node: &Node) -> (usize, usize) {
    (node.start_position().row + 1, node.end_position().row + 1)
}

/// Check for an anonymous token among a node's direct children
/// (also looks inside `function_modifiers` for Rust).
pub(crate) fn has_token(node: &Node, token: &str) -> bool {
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            if child.kind() == token {
                return true;
            }
            if child.kind() == "function_modifiers" {
                for j in 0..child.child_count() {
                    if child.child(j).is_some_and(|n| n.kind() == token) {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Append preserving first-occurrence order.
pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

/// Strip matching string quotes.
pub(crate) fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    let s = s.strip_prefix('f').unwrap_or(s);
    if s.len() >= 2 {
        let first = s.chars().next().unwrap();
        let last = s.chars().last().unwrap();
        if (first == '"' && last == '"')
            || (first == '\'' && last == '\'')
            || (first == '`' && last == '`')
        {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}
