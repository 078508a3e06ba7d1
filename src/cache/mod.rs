//! Invalidation-aware scan cache.
//!
//! Parsed records, the file graph, and scan metadata are persisted per
//! project through a pluggable [`CacheStore`]. Partitions are keyed by a
//! stable hash of the normalized project root, so the same project lands in
//! the same partition across restarts. Per-file `(mtime, size)` fingerprints
//! decide which files must be re-parsed; a partition-level timestamp bounds
//! overall cache age. Any unreadable stored blob is a miss, never an error.

pub mod store;

pub use store::{CacheStore, FileStore, MemoryStore};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::parser::SourceFile;

/// Parsed records keyed by file id.
pub type ParsedFiles = BTreeMap<String, SourceFile>;

/// The staleness fingerprint recorded per file at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
    pub mtime_ms: i64,
    pub size_bytes: u64,
}

/// Partition-level scan metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scan_timestamp: DateTime<Utc>,
    pub file_count: usize,
    pub function_count: usize,
    pub class_count: usize,
    pub fingerprints: BTreeMap<String, Fingerprint>,
}

/// What `cache_stats` reports for one partition.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub file_count: usize,
    pub cache_size_bytes: u64,
    pub last_scan: Option<DateTime<Utc>>,
}

const KEY_FILES: &str = "files";
const KEY_GRAPH: &str = "graph";
const KEY_META: &str = "meta";
const KEY_REGISTRY: &str = "projects";

pub struct CacheManager {
    store: Box<dyn CacheStore>,
    /// Per-partition locks so a concurrent clear cannot race a save.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheManager {
    pub fn new(store: Box<dyn CacheStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Stable partition key for a project root.
    pub fn partition_key(root: &Path) -> String {
        let normalized = normalize_root(root);
        let digest = Sha256::digest(normalized.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
        hex[..16].to_string()
    }

    fn lock_for(&self, partition: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks.entry(partition.to_string()).or_default().clone()
    }

    // ─── Save / Load ────────────────────────────────────────────

    pub fn save_parsed_files(&self, root: &Path, files: &ParsedFiles) -> Result<()> {
        self.save_record(root, KEY_FILES, files)
    }

    pub fn load_parsed_files(&self, root: &Path) -> Option<ParsedFiles> {
        self.load_record(root, KEY_FILES)
    }

    pub fn save_graph(&self, root: &Path, graph: &DependencyGraph) -> Result<()> {
        self.save_record(root, KEY_GRAPH, graph)
    }

    pub fn load_graph(&self, root: &Path) -> Option<DependencyGraph> {
        self.load_record(root, KEY_GRAPH)
    }

    pub fn save_metadata(&self, root: &Path, metadata: &ScanMetadata) -> Result<()> {
        self.save_record(root, KEY_META, metadata)
    }

    pub fn load_metadata(&self, root: &Path) -> Option<ScanMetadata> {
        self.load_record(root, KEY_META)
    }

    fn save_record<T: Serialize>(&self, root: &Path, record: &str, value: &T) -> Result<()> {
        let partition = Self::partition_key(root);
        let lock = self.lock_for(&partition);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let bytes = bincode::serialize(value)
            .map_err(|e| crate::error::AtlasError::Cache(e.to_string()))?;
        self.store.put(&format!("{partition}/{record}"), &bytes)?;
        self.register_partition(&partition)?;
        Ok(())
    }

    fn load_record<T: for<'de> Deserialize<'de>>(&self, root: &Path, record: &str) -> Option<T> {
        let partition = Self::partition_key(root);
        let lock = self.lock_for(&partition);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let bytes = self.store.get(&format!("{partition}/{record}"))?;
        match bincode::deserialize(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                // Corrupt data is a miss; the caller falls back to a rescan.
                warn!(partition, record, error = %e, "unreadable cache record, treating as miss");
                None
            }
        }
    }

    // ─── Validity ───────────────────────────────────────────────

    /// False when metadata is missing or the last scan is older than
    /// `max_age_hours`.
    pub fn is_cache_valid(&self, root: &Path, max_age_hours: i64) -> bool {
        match self.load_metadata(root) {
            Some(meta) => Utc::now() - meta.scan_timestamp <= Duration::hours(max_age_hours),
            None => false,
        }
    }

    /// True when either the recorded mtime or size differs from the current
    /// observation. Drives a single-file re-parse, not a full rescan.
    pub fn should_invalidate_file(recorded: &Fingerprint, current: &Fingerprint) -> bool {
        recorded.mtime_ms != current.mtime_ms || recorded.size_bytes != current.size_bytes
    }

    // ─── Maintenance ────────────────────────────────────────────

    /// Clear one partition or all of them; returns how many were cleared.
    pub fn clear_cache(&self, root: Option<&Path>) -> usize {
        match root {
            Some(root) => {
                let partition = Self::partition_key(root);
                if self.clear_partition(&partition) {
                    1
                } else {
                    0
                }
            }
            None => {
                let partitions = self.registered_partitions();
                let mut cleared = 0;
                for partition in &partitions {
                    if self.clear_partition(partition) {
                        cleared += 1;
                    }
                }
                self.store.delete(KEY_REGISTRY);
                cleared
            }
        }
    }

    fn clear_partition(&self, partition: &str) -> bool {
        let lock = self.lock_for(partition);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut existed = false;
        for record in [KEY_FILES, KEY_GRAPH, KEY_META] {
            existed |= self.store.delete(&format!("{partition}/{record}"));
        }
        if existed {
            debug!(partition, "cache partition cleared");
        }
        let _ = self.deregister_partition(partition);
        existed
    }

    /// Stats for one partition, or `None` when nothing is cached for it.
    pub fn cache_stats(&self, root: &Path) -> Option<CacheStats> {
        let partition = Self::partition_key(root);
        let lock = self.lock_for(&partition);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut size = 0u64;
        let mut any = false;
        for record in [KEY_FILES, KEY_GRAPH, KEY_META] {
            if let Some(bytes) = self.store.get(&format!("{partition}/{record}")) {
                size += bytes.len() as u64;
                any = true;
            }
        }
        if !any {
            return None;
        }

        // Read metadata directly; the partition lock is already held.
        let meta: Option<ScanMetadata> = self
            .store
            .get(&format!("{partition}/{KEY_META}"))
            .and_then(|bytes| bincode::deserialize(&bytes).ok());

        Some(CacheStats {
            file_count: meta.as_ref().map(|m| m.file_count).unwrap_or(0),
            cache_size_bytes: size,
            last_scan: meta.map(|m| m.scan_timestamp),
        })
    }

    // ─── Partition registry ─────────────────────────────────────
    //
    // The store contract is get/put/delete-by-key only, so clear-all needs
    // an explicit index of known partitions.

    fn registered_partitions(&self) -> Vec<String> {
        self.store
            .get(KEY_REGISTRY)
            .and_then(|bytes| bincode::deserialize(&bytes).ok())
            .unwrap_or_default()
    }

    fn register_partition(&self, partition: &str) -> Result<()> {
        let mut partitions = self.registered_partitions();
        if !partitions.iter().any(|p| p == partition) {
            partitions.push(partition.to_string());
            partitions.sort();
            let bytes = bincode::serialize(&partitions)
                .map_err(|e| crate::error::AtlasError::Cache(e.to_string()))?;
            self.store.put(KEY_REGISTRY, &bytes)?;
        }
        Ok(())
    }

    fn deregister_partition(&self, partition: &str) -> Result<()> {
        let mut partitions = self.registered_partitions();
        let before = partitions.len();
        partitions.retain(|p| p != partition);
        if partitions.len() != before {
            let bytes = bincode::serialize(&partitions)
                .map_err(|e| crate::error::AtlasError::Cache(e.to_string()))?;
            self.store.put(KEY_REGISTRY, &bytes)?;
        }
        Ok(())
    }
}

/// Normalize a project root to a stable string: absolute where possible,
/// forward slashes, no trailing separator.
fn normalize_root(root: &Path) -> String {
    let absolute: PathBuf = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    let mut s = absolute.to_string_lossy().replace('\\', "/");
    while s.len() > 1 && s.ends_with('/') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Language;

    fn manager() -> CacheManager {
        CacheManager::new(Box::new(MemoryStore::new()))
    }

    fn sample_files() -> ParsedFiles {
        let mut files = ParsedFiles::new();
        files.insert(
            "a.py".to_string(),
            SourceFile::empty("a.py", Language::Python, 120, 10, true),
        );
        files.insert(
            "b.py".to_string(),
            SourceFile::empty("b.py", Language::Python, 80, 6, true),
        );
        files
    }

    fn sample_metadata(age: Duration) -> ScanMetadata {
        let mut fingerprints = BTreeMap::new();
        fingerprints.insert(
            "a.py".to_string(),
            Fingerprint {
                mtime_ms: 1_700_000_000_000,
                size_bytes: 120,
            },
        );
        ScanMetadata {
            scan_timestamp: Utc::now() - age,
            file_count: 2,
            function_count: 3,
            class_count: 1,
            fingerprints,
        }
    }

    #[test]
    fn test_round_trip_parsed_files() {
        let cache = manager();
        let root = Path::new("/proj");
        let files = sample_files();

        cache.save_parsed_files(root, &files).unwrap();
        let loaded = cache.load_parsed_files(root).unwrap();
        assert_eq!(loaded, files);
    }

    #[test]
    fn test_round_trip_metadata_and_graph() {
        let cache = manager();
        let root = Path::new("/proj");

        cache.save_metadata(root, &sample_metadata(Duration::zero())).unwrap();
        let meta = cache.load_metadata(root).unwrap();
        assert_eq!(meta.file_count, 2);
        assert_eq!(meta.fingerprints["a.py"].size_bytes, 120);

        let graph = DependencyGraph::default();
        cache.save_graph(root, &graph).unwrap();
        assert!(cache.load_graph(root).is_some());
    }

    #[test]
    fn test_miss_is_none() {
        let cache = manager();
        assert!(cache.load_parsed_files(Path::new("/nothing")).is_none());
        assert!(cache.load_graph(Path::new("/nothing")).is_none());
    }

    #[test]
    fn test_corrupt_record_is_miss() {
        let cache = manager();
        let root = Path::new("/proj");
        let partition = CacheManager::partition_key(root);

        cache.store.put(&format!("{partition}/files"), b"\x00garbage").unwrap();
        assert!(cache.load_parsed_files(root).is_none());
    }

    #[test]
    fn test_cache_validity_by_age() {
        let cache = manager();
        let root = Path::new("/proj");

        assert!(!cache.is_cache_valid(root, 24), "missing metadata is invalid");

        cache.save_metadata(root, &sample_metadata(Duration::hours(1))).unwrap();
        assert!(cache.is_cache_valid(root, 24));

        cache.save_metadata(root, &sample_metadata(Duration::hours(30))).unwrap();
        assert!(!cache.is_cache_valid(root, 24));
    }

    #[test]
    fn test_should_invalidate_on_fingerprint_change() {
        let recorded = Fingerprint {
            mtime_ms: 1000,
            size_bytes: 50,
        };
        assert!(!CacheManager::should_invalidate_file(&recorded, &recorded));
        assert!(CacheManager::should_invalidate_file(
            &recorded,
            &Fingerprint { mtime_ms: 2000, size_bytes: 50 }
        ));
        assert!(CacheManager::should_invalidate_file(
            &recorded,
            &Fingerprint { mtime_ms: 1000, size_bytes: 51 }
        ));
    }

    #[test]
    fn test_clear_single_partition() {
        let cache = manager();
        let root = Path::new("/proj");

        cache.save_parsed_files(root, &sample_files()).unwrap();
        assert_eq!(cache.clear_cache(Some(root)), 1);
        assert!(cache.load_parsed_files(root).is_none());
        assert_eq!(cache.clear_cache(Some(root)), 0, "already empty");
    }

    #[test]
    fn test_clear_all_partitions() {
        let cache = manager();
        let roots = [Path::new("/p1"), Path::new("/p2"), Path::new("/p3")];
        for root in &roots {
            cache.save_parsed_files(root, &sample_files()).unwrap();
        }

        assert_eq!(cache.clear_cache(None), 3);
        for root in &roots {
            assert!(cache.load_parsed_files(root).is_none());
        }
        assert_eq!(cache.clear_cache(None), 0);
    }

    #[test]
    fn test_partition_key_is_stable() {
        let a = CacheManager::partition_key(Path::new("/home/u/proj"));
        let b = CacheManager::partition_key(Path::new("/home/u/proj/"));
        assert_eq!(a, b, "trailing separators do not change the partition");
        assert_eq!(a.len(), 16);

        let other = CacheManager::partition_key(Path::new("/home/u/other"));
        assert_ne!(a, other);
    }

    #[test]
    fn test_cache_stats() {
        let cache = manager();
        let root = Path::new("/proj");
        assert!(cache.cache_stats(root).is_none());

        cache.save_parsed_files(root, &sample_files()).unwrap();
        cache.save_metadata(root, &sample_metadata(Duration::zero())).unwrap();

        let stats = cache.cache_stats(root).unwrap();
        assert_eq!(stats.file_count, 2);
        assert!(stats.cache_size_bytes > 0);
        assert!(stats.last_scan.is_some());
    }

    #[test]
    fn test_file_store_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheManager::new(Box::new(FileStore::new(dir.path())));
        let root = Path::new("/proj");

        cache.save_parsed_files(root, &sample_files()).unwrap();
        let loaded = cache.load_parsed_files(root).unwrap();
        assert_eq!(loaded.len(), 2);

        assert_eq!(cache.clear_cache(None), 1);
        assert!(cache.load_parsed_files(root).is_none());
    }
}
