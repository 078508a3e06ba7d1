//! The scan facade — wires parser, analyzer, and cache together.
//!
//! `Atlas` owns the collaborators and exposes the operations a request
//! layer consumes: scan, graph retrieval, per-file details, project stats,
//! and cache clearing. Parsing fans out across rayon workers; everything
//! downstream of parsing is single-threaded on the current analyzer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::{CacheManager, CacheStats, Fingerprint, ParsedFiles, ScanMetadata};
use crate::config::AtlasConfig;
use crate::error::{AtlasError, Result};
use crate::graph::{
    DependencyAnalyzer, DependencyGraph, FileDependencies, GraphData, GraphKind,
};
use crate::parser::{self, SourceFile};
use crate::source::ProjectSource;

/// Options for one scan call.
#[derive(Clone, Default)]
pub struct ScanOptions {
    /// Skip the cache entirely and re-parse everything.
    pub no_cache: bool,
    /// Cooperative cancellation; checked between files, never mid-file.
    pub cancel: Option<Arc<AtomicBool>>,
}

/// What a scan reports back.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub file_count: usize,
    pub function_count: usize,
    pub class_count: usize,
    pub cached: bool,
}

/// Aggregate project statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub file_count: usize,
    pub function_count: usize,
    pub class_count: usize,
    pub cycle_count: usize,
    pub dead_file_count: usize,
}

/// A parse record combined with its resolved dependency lists.
#[derive(Debug, Clone, Serialize)]
pub struct FileDetails {
    #[serde(flatten)]
    pub file: SourceFile,
    pub dependencies: FileDependencies,
}

struct ProjectState {
    root: PathBuf,
    analyzer: DependencyAnalyzer,
    graph: DependencyGraph,
    entry_points: Vec<String>,
}

pub struct Atlas<S: ProjectSource> {
    source: S,
    cache: CacheManager,
    config: AtlasConfig,
    state: Option<ProjectState>,
}

impl<S: ProjectSource> Atlas<S> {
    pub fn new(source: S, cache: CacheManager, config: AtlasConfig) -> Self {
        Self {
            source,
            cache,
            config,
            state: None,
        }
    }

    /// Scan a project root.
    ///
    /// A valid cache with no stale fingerprints answers without parsing
    /// anything (`cached = true`). Otherwise only fingerprint-stale and
    /// new files are re-parsed; records for deleted files are dropped; the
    /// graph is rebuilt and the cache rewritten.
    pub fn scan(
        &mut self,
        root: &Path,
        entry_points: &[String],
        options: &ScanOptions,
    ) -> Result<ScanSummary> {
        let started = Instant::now();
        let listing = self.source.list_files(root)?;
        let aliases = self.source.load_alias_table(root);

        // Current fingerprints keyed by normalized file id.
        let mut current: BTreeMap<String, (PathBuf, Fingerprint)> = BTreeMap::new();
        for meta in &listing {
            let id = file_id(root, &meta.path);
            current.insert(
                id,
                (
                    meta.path.clone(),
                    Fingerprint {
                        mtime_ms: meta.mtime_ms,
                        size_bytes: meta.size_bytes,
                    },
                ),
            );
        }

        let use_cache =
            !options.no_cache && self.cache.is_cache_valid(root, self.config.max_cache_age_hours);

        let mut files: Option<ParsedFiles> = None;
        if use_cache {
            if let (Some(cached_files), Some(meta)) = (
                self.cache.load_parsed_files(root),
                self.cache.load_metadata(root),
            ) {
                let stale: Vec<(String, PathBuf)> = current
                    .iter()
                    .filter(|(id, (_, fp))| {
                        meta.fingerprints
                            .get(*id)
                            .map_or(true, |rec| CacheManager::should_invalidate_file(rec, fp))
                    })
                    .map(|(id, (path, _))| (id.clone(), path.clone()))
                    .collect();
                let removed: Vec<String> = cached_files
                    .keys()
                    .filter(|id| !current.contains_key(*id))
                    .cloned()
                    .collect();

                if stale.is_empty() && removed.is_empty() {
                    if let Some(graph) = self.cache.load_graph(root) {
                        info!(
                            files = cached_files.len(),
                            "scan served from cache in {:?}",
                            started.elapsed()
                        );
                        let summary = ScanSummary {
                            file_count: meta.file_count,
                            function_count: meta.function_count,
                            class_count: meta.class_count,
                            cached: true,
                        };
                        self.install_state(root, aliases, cached_files, graph, entry_points);
                        return Ok(summary);
                    }
                } else {
                    debug!(
                        stale = stale.len(),
                        removed = removed.len(),
                        "cache partially stale, re-parsing changed files"
                    );
                    let mut reused = cached_files;
                    for id in removed {
                        reused.remove(&id);
                    }
                    for file in self.parse_batch(&stale, options) {
                        reused.insert(file.id.clone(), file);
                    }
                    files = Some(reused);
                }
            }
        }

        let files = match files {
            Some(files) => files,
            None => {
                let targets: Vec<(String, PathBuf)> = current
                    .iter()
                    .map(|(id, (path, _))| (id.clone(), path.clone()))
                    .collect();
                let mut parsed = ParsedFiles::new();
                for file in self.parse_batch(&targets, options) {
                    parsed.insert(file.id.clone(), file);
                }
                parsed
            }
        };

        let mut analyzer = DependencyAnalyzer::new(aliases);
        for file in files.values() {
            analyzer.add_file(file.clone());
        }
        let graph = analyzer.build_file_graph();

        let function_count: usize = files.values().map(|f| f.function_count()).sum();
        let class_count: usize = files.values().map(|f| f.classes.len()).sum();
        let metadata = ScanMetadata {
            scan_timestamp: Utc::now(),
            file_count: files.len(),
            function_count,
            class_count,
            fingerprints: current
                .into_iter()
                .map(|(id, (_, fp))| (id, fp))
                .collect(),
        };

        // A cancelled scan is incomplete; persisting it would let the next
        // scan serve the truncated result as fresh.
        let cancelled = options
            .cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed));
        if cancelled {
            debug!("scan cancelled, cache left untouched");
        } else {
            self.cache.save_parsed_files(root, &files)?;
            self.cache.save_graph(root, &graph)?;
            self.cache.save_metadata(root, &metadata)?;
        }

        info!(
            files = metadata.file_count,
            functions = function_count,
            "scan complete in {:?}",
            started.elapsed()
        );

        let summary = ScanSummary {
            file_count: metadata.file_count,
            function_count,
            class_count,
            cached: false,
        };
        self.state = Some(ProjectState {
            root: root.to_path_buf(),
            analyzer,
            graph,
            entry_points: self.merged_entry_points(entry_points),
        });
        Ok(summary)
    }

    /// Retrieve a derived graph for the current scan.
    pub fn graph(&self, kind: GraphKind) -> Result<GraphData> {
        let state = self.state.as_ref().ok_or(AtlasError::NoScan)?;
        Ok(match kind {
            GraphKind::File => GraphData::File(state.graph.clone()),
            GraphKind::Function => GraphData::Function(state.analyzer.build_function_graph()),
        })
    }

    /// Parse record plus resolved dependency lists for one file.
    pub fn file_details(&self, file_id: &str) -> Result<FileDetails> {
        let state = self.state.as_ref().ok_or(AtlasError::NoScan)?;
        let file = state
            .analyzer
            .file(file_id)
            .ok_or_else(|| AtlasError::UnknownFile(file_id.to_string()))?
            .clone();
        let dependencies = state.analyzer.file_dependencies(file_id);
        Ok(FileDetails { file, dependencies })
    }

    /// Aggregate stats for the current scan.
    pub fn stats(&self) -> Result<ProjectStats> {
        let state = self.state.as_ref().ok_or(AtlasError::NoScan)?;
        let files = state.analyzer.files();
        let dead = state.analyzer.find_dead_code(&state.entry_points);
        Ok(ProjectStats {
            file_count: files.len(),
            function_count: files.values().map(|f| f.function_count()).sum(),
            class_count: files.values().map(|f| f.classes.len()).sum(),
            cycle_count: state.analyzer.detect_circular_dependencies().len(),
            dead_file_count: dead.files.len(),
        })
    }

    /// Files and functions never referenced, given the current scan's
    /// entry points.
    pub fn dead_code(&self) -> Result<crate::graph::DeadCode> {
        let state = self.state.as_ref().ok_or(AtlasError::NoScan)?;
        Ok(state.analyzer.find_dead_code(&state.entry_points))
    }

    /// All elementary import cycles of the current scan.
    pub fn cycles(&self) -> Result<Vec<Vec<String>>> {
        let state = self.state.as_ref().ok_or(AtlasError::NoScan)?;
        Ok(state.analyzer.detect_circular_dependencies())
    }

    /// Clear one cache partition or all of them.
    pub fn clear_cache(&self, root: Option<&Path>) -> usize {
        self.cache.clear_cache(root)
    }

    /// Cache stats for a project root.
    pub fn cache_stats(&self, root: &Path) -> Option<CacheStats> {
        self.cache.cache_stats(root)
    }

    /// The root of the current scan, if any.
    pub fn current_root(&self) -> Option<&Path> {
        self.state.as_ref().map(|s| s.root.as_path())
    }

    // ─── Internals ──────────────────────────────────────────────

    fn install_state(
        &mut self,
        root: &Path,
        aliases: crate::graph::AliasTable,
        files: ParsedFiles,
        graph: DependencyGraph,
        entry_points: &[String],
    ) {
        let mut analyzer = DependencyAnalyzer::new(aliases);
        for file in files.into_values() {
            analyzer.add_file(file);
        }
        self.state = Some(ProjectState {
            root: root.to_path_buf(),
            analyzer,
            graph,
            entry_points: self.merged_entry_points(entry_points),
        });
    }

    fn merged_entry_points(&self, explicit: &[String]) -> Vec<String> {
        let mut entries = explicit.to_vec();
        for extra in &self.config.entry_points {
            if !entries.contains(extra) {
                entries.push(extra.clone());
            }
        }
        entries
    }

    /// Parse a batch of files on rayon workers. A raised cancel flag stops
    /// scheduling new files; whatever already started finishes normally.
    fn parse_batch(
        &self,
        targets: &[(String, PathBuf)],
        options: &ScanOptions,
    ) -> Vec<SourceFile> {
        let results: Mutex<Vec<SourceFile>> = Mutex::new(Vec::with_capacity(targets.len()));

        targets.par_iter().for_each(|(id, path)| {
            if let Some(cancel) = &options.cancel {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
            }
            let file = match self.source.read_bytes(path) {
                Ok(bytes) => parser::parse(id, &bytes),
                Err(e) => {
                    warn!(file = id.as_str(), error = %e, "unreadable file, keeping empty node");
                    SourceFile::empty(id, parser::Language::from_file_id(id), 0, 0, false)
                }
            };
            results
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(file);
        });

        results.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Normalized project-relative id: forward slashes, no leading slash.
fn file_id(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
