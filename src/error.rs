//! Error types for codeatlas.

use thiserror::Error;

/// Errors surfaced by the public API.
///
/// Nothing in the scan pipeline itself is fatal: parse failures, unresolved
/// imports, and cache corruption are all contained where they happen. These
/// variants cover the caller-facing operations only.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// A query was made before any scan populated the in-memory state.
    #[error("no scan has been run for this session")]
    NoScan,

    /// A file id was requested that the current scan does not contain.
    #[error("file not present in the current scan: {0}")]
    UnknownFile(String),

    /// The cache storage backend rejected an operation.
    #[error("cache storage failure: {0}")]
    Cache(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AtlasError>;
