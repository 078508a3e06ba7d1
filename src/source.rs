//! Project input collaborators.
//!
//! The core never walks directories itself; it consumes a [`ProjectSource`]
//! that lists candidate files, supplies raw bytes, and loads the project's
//! alias table. [`FsProjectSource`] is the production implementation
//! (gitignore-aware via the `ignore` crate); [`MemorySource`] backs tests
//! and embedding callers that already hold file contents.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::WalkBuilder;
use tracing::debug;

use crate::error::Result;
use crate::graph::AliasTable;
use crate::parser::Language;

/// One candidate file as reported by `list_files`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub path: PathBuf,
    pub mtime_ms: i64,
    pub size_bytes: u64,
}

/// Supplies file listings, file contents, and the alias table for a root.
pub trait ProjectSource: Send + Sync {
    /// Ordered candidate files under `root`.
    fn list_files(&self, root: &Path) -> Result<Vec<FileMeta>>;

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>>;

    /// Path alias table for the project; empty when none is configured.
    fn load_alias_table(&self, root: &Path) -> AliasTable;
}

// ─── Filesystem implementation ──────────────────────────────────────────

/// Walks the real filesystem, honoring .gitignore and the configured
/// exclusion list, and reads tsconfig/jsconfig path aliases.
pub struct FsProjectSource {
    excluded_dirs: Vec<String>,
}

impl FsProjectSource {
    pub fn new(excluded_dirs: Vec<String>) -> Self {
        Self { excluded_dirs }
    }
}

impl ProjectSource for FsProjectSource {
    fn list_files(&self, root: &Path) -> Result<Vec<FileMeta>> {
        let excluded = self.excluded_dirs.clone();
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .hidden(true)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .filter_entry(move |entry| {
                if entry.depth() == 0 {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !(entry.file_type().is_some_and(|ft| ft.is_dir())
                    && excluded.iter().any(|d| d == name.as_ref()))
            })
            .build();

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let ext = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            if !Language::is_source_extension(ext) {
                continue;
            }
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            let mtime_ms = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as i64)
                .unwrap_or(0);
            files.push(FileMeta {
                path: entry.into_path(),
                mtime_ms,
                size_bytes: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn load_alias_table(&self, root: &Path) -> AliasTable {
        for config_name in ["tsconfig.json", "jsconfig.json"] {
            let path = root.join(config_name);
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => match parse_alias_config(&content) {
                    Some(table) => {
                        debug!(config = config_name, "loaded path aliases");
                        return table;
                    }
                    None => {
                        debug!(config = config_name, "no usable path aliases");
                    }
                },
                Err(_) => continue,
            }
        }
        AliasTable::default()
    }
}

/// Extract `compilerOptions.paths` (honoring `baseUrl`) into an alias
/// table, longest prefixes first so the most specific pattern wins.
fn parse_alias_config(content: &str) -> Option<AliasTable> {
    let value: serde_json::Value = serde_json::from_str(content).ok()?;
    let options = value.get("compilerOptions")?;
    let base_url = options
        .get("baseUrl")
        .and_then(|v| v.as_str())
        .map(clean_segment)
        .filter(|s| !s.is_empty());
    let paths = options.get("paths")?.as_object()?;

    let mut pairs: Vec<(String, String)> = Vec::new();
    for (pattern, targets) in paths {
        let Some(first) = targets.as_array().and_then(|a| a.first()).and_then(|v| v.as_str())
        else {
            continue;
        };
        let target = clean_segment(first);
        let base = match &base_url {
            Some(prefix) => format!("{prefix}/{target}"),
            None => target,
        };
        pairs.push((pattern.clone(), base));
    }
    if pairs.is_empty() {
        return None;
    }
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(&b.0)));
    Some(AliasTable::from_pairs(pairs))
}

fn clean_segment(s: &str) -> String {
    let s = s.trim_start_matches("./").trim_matches('/');
    if s == "." {
        String::new()
    } else {
        s.to_string()
    }
}

// ─── In-memory implementation ───────────────────────────────────────────

/// A source backed by in-memory contents; ids are project-relative paths.
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, (Vec<u8>, i64)>,
    aliases: AliasTable,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_aliases(aliases: AliasTable) -> Self {
        Self {
            files: BTreeMap::new(),
            aliases,
        }
    }

    pub fn insert(&mut self, id: &str, content: &str) {
        self.insert_with_mtime(id, content, 0);
    }

    pub fn insert_with_mtime(&mut self, id: &str, content: &str, mtime_ms: i64) {
        self.files
            .insert(id.to_string(), (content.as_bytes().to_vec(), mtime_ms));
    }

    pub fn remove(&mut self, id: &str) {
        self.files.remove(id);
    }
}

impl ProjectSource for MemorySource {
    fn list_files(&self, _root: &Path) -> Result<Vec<FileMeta>> {
        Ok(self
            .files
            .iter()
            .map(|(id, (bytes, mtime_ms))| FileMeta {
                path: PathBuf::from(id),
                mtime_ms: *mtime_ms,
                size_bytes: bytes.len() as u64,
            })
            .collect())
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        let id = path.to_string_lossy().replace('\\', "/");
        self.files
            .get(&id)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| crate::error::AtlasError::UnknownFile(id))
    }

    fn load_alias_table(&self, _root: &Path) -> AliasTable {
        self.aliases.clone()
    }
}
