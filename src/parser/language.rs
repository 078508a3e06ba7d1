//! Language detection and tree-sitter grammar loading.

use serde::{Deserialize, Serialize};
use tree_sitter::Language as TsLanguage;

/// Extraction strategy for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    /// Full syntax tree via tree-sitter.
    Grammar,
    /// Best-effort line scanning with regexes.
    Heuristic,
    /// Recorded but not parsed at all.
    None,
}

/// Supported language families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Java,
    Ruby,
    CSharp,
    /// Extension not recognized; the file still counts as a node.
    Unknown,
}

/// Extensions tried, in order, when resolving an import specifier to a
/// file id. The order is fixed so resolution stays deterministic.
pub const RESOLVE_EXTENSIONS: &[&str] = &[
    ".py", ".rs", ".js", ".jsx", ".mjs", ".cjs", ".ts", ".tsx", ".go", ".java", ".rb", ".cs",
];

impl Language {
    /// Detect language from a file id or path by extension.
    pub fn from_file_id(id: &str) -> Self {
        let ext = match id.rsplit_once('.') {
            Some((_, ext)) => ext,
            None => return Language::Unknown,
        };
        match ext {
            "rs" => Language::Rust,
            "py" | "pyw" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "go" => Language::Go,
            "java" => Language::Java,
            "rb" => Language::Ruby,
            "cs" => Language::CSharp,
            _ => Language::Unknown,
        }
    }

    /// Which extraction strategy serves this language.
    pub fn strategy(&self) -> ParseStrategy {
        match self {
            Language::Rust
            | Language::Python
            | Language::JavaScript
            | Language::TypeScript
            | Language::Tsx => ParseStrategy::Grammar,
            Language::Go | Language::Java | Language::Ruby | Language::CSharp => {
                ParseStrategy::Heuristic
            }
            Language::Unknown => ParseStrategy::None,
        }
    }

    /// Get the tree-sitter grammar for grammar-strategy languages.
    pub fn grammar(&self) -> Option<TsLanguage> {
        match self {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            _ => None,
        }
    }

    /// Get the display name.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Tsx => "TSX",
            Language::Go => "Go",
            Language::Java => "Java",
            Language::Ruby => "Ruby",
            Language::CSharp => "C#",
            Language::Unknown => "unknown",
        }
    }

    /// True when the extension belongs to any supported family.
    pub fn is_source_extension(ext: &str) -> bool {
        !matches!(Language::from_file_id(&format!("x.{ext}")), Language::Unknown)
    }
}
