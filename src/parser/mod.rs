//! Per-file structural extraction.
//!
//! `parse` turns one file's raw bytes into a [`SourceFile`] record with no
//! cross-file knowledge, so calls are embarrassingly parallel. Dispatch is
//! by extension into one of two strategies: grammar-based (tree-sitter) or
//! heuristic (regex line scanning). Parsing never fails the scan: malformed
//! grammar-strategy input yields `parse_ok = false` with empty structure,
//! and unrecognized extensions yield `language = unknown`.

pub mod grammar;
pub mod heuristic;
pub mod language;
pub mod types;

pub use language::{Language, ParseStrategy, RESOLVE_EXTENSIONS};
pub use types::{Class, Function, ImportKind, ImportStatement, MethodKind, SourceFile};

use tracing::debug;

/// Parse one file into its structural record.
///
/// `file_id` is the normalized project-relative path; `bytes` the raw file
/// content. Non-UTF-8 sequences are replaced, not rejected.
pub fn parse(file_id: &str, bytes: &[u8]) -> SourceFile {
    let language = Language::from_file_id(file_id);
    let size_bytes = bytes.len() as u64;
    let source = String::from_utf8_lossy(bytes);
    let line_count = source.lines().count();

    match language.strategy() {
        ParseStrategy::Grammar => match grammar::extract(language, &source) {
            Some(extraction) => assemble(file_id, language, size_bytes, line_count, extraction),
            None => {
                debug!(file = file_id, "syntax errors, keeping file as empty node");
                SourceFile::empty(file_id, language, size_bytes, line_count, false)
            }
        },
        ParseStrategy::Heuristic => {
            let extraction = heuristic::extract(language, &source);
            assemble(file_id, language, size_bytes, line_count, extraction)
        }
        ParseStrategy::None => {
            debug!(file = file_id, "unrecognized extension, recording without structure");
            SourceFile::empty(file_id, language, size_bytes, line_count, true)
        }
    }
}

fn assemble(
    file_id: &str,
    language: Language,
    size_bytes: u64,
    line_count: usize,
    extraction: grammar::Extraction,
) -> SourceFile {
    SourceFile {
        id: file_id.to_string(),
        language,
        size_bytes,
        line_count,
        functions: extraction.functions,
        classes: extraction.classes,
        imports: extraction.imports,
        parse_ok: true,
    }
}
