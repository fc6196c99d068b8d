// Auto-skip: the persisted run configuration compared against the current
// one. Skipping is purely an optimization; it never affects accepted runs.

use crate::config::{AppConfig, BenchmarkConfig, CalibrationConfig, TargetConfig};
use crate::executor::ResourceProfile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Every measurement-relevant setting. Changing any of these invalidates
/// previously written tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheKey {
    pub benchmark: BenchmarkConfig,
    pub calibration: CalibrationConfig,
    pub profile: ResourceProfile,
    pub targets: Vec<TargetConfig>,
}

impl CacheKey {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            benchmark: config.benchmark.clone(),
            calibration: config.calibration.clone(),
            profile: config.profile.clone(),
            targets: config.targets.clone(),
        }
    }
}

pub trait RunCache {
    /// The key persisted by the previous run, if any. Unreadable or
    /// unparseable state counts as absent.
    fn get(&self) -> Option<CacheKey>;
    fn put(&mut self, key: &CacheKey) -> anyhow::Result<()>;
}

/// JSON file store, one key per file.
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RunCache for FileCache {
    fn get(&self) -> Option<CacheKey> {
        let data = std::fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&data).ok()
    }

    fn put(&mut self, key: &CacheKey) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(key)?)?;
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    stored: Option<CacheKey>,
}

impl RunCache for MemoryCache {
    fn get(&self) -> Option<CacheKey> {
        self.stored.clone()
    }

    fn put(&mut self, key: &CacheKey) -> anyhow::Result<()> {
        self.stored = Some(key.clone());
        Ok(())
    }
}

/// Skip a target only when the persisted configuration equals the current
/// one and that target's outputs already exist on disk.
pub fn should_skip(persisted: Option<&CacheKey>, current: &CacheKey, outputs_exist: bool) -> bool {
    persisted.is_some_and(|p| p == current) && outputs_exist
}
