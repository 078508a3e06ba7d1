//! Configuration for codeatlas scans.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

/// Scan and cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Directory for the persistent cache backend.
    pub cache_dir: PathBuf,

    /// Cached scans older than this are ignored.
    pub max_cache_age_hours: i64,

    /// Include `tests`/`test` directories in scans.
    pub include_tests: bool,

    /// Directory names skipped while listing files.
    pub excluded_dirs: Vec<String>,

    /// Extra entry-point file ids, added to the conventional allow-list
    /// for dead-code detection.
    pub entry_points: Vec<String>,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".codeatlas"),
            max_cache_age_hours: 24,
            include_tests: false,
            excluded_dirs: vec![
                ".git".to_string(),
                "__pycache__".to_string(),
                ".venv".to_string(),
                "venv".to_string(),
                "node_modules".to_string(),
                "target".to_string(),
                "dist".to_string(),
                "build".to_string(),
            ],
            entry_points: Vec::new(),
        }
    }
}

impl AtlasConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AtlasError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| AtlasError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directories to skip for this configuration, test dirs included
    /// unless requested.
    pub fn effective_excluded_dirs(&self) -> Vec<String> {
        let mut dirs = self.excluded_dirs.clone();
        if !self.include_tests {
            dirs.push("tests".to_string());
            dirs.push("test".to_string());
        }
        dirs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AtlasConfig::default();
        assert_eq!(config.max_cache_age_hours, 24);
        assert!(!config.include_tests);
        assert!(config.excluded_dirs.iter().any(|d| d == "node_modules"));
    }

    #[test]
    fn test_test_dirs_follow_flag() {
        let mut config = AtlasConfig::default();
        assert!(config.effective_excluded_dirs().contains(&"tests".to_string()));
        config.include_tests = true;
        assert!(!config.effective_excluded_dirs().contains(&"tests".to_string()));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atlas.toml");

        let mut config = AtlasConfig::default();
        config.max_cache_age_hours = 6;
        config.entry_points.push("scripts/cron.py".to_string());
        config.to_file(&path).unwrap();

        let loaded = AtlasConfig::from_file(&path).unwrap();
        assert_eq!(loaded.max_cache_age_hours, 6);
        assert_eq!(loaded.entry_points, vec!["scripts/cron.py"]);
    }
}
