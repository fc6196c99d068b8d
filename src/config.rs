use crate::executor::ResourceProfile;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub benchmark: BenchmarkConfig,
    pub calibration: CalibrationConfig,
    pub profile: ResourceProfile,
    pub results: ResultsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Accepted samples to collect per target.
    pub sample_count: usize,
    /// Reject a sample when calibration drifts by at least this percentage.
    pub change_threshold_pct: f64,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    /// Give up after this many consecutive drift rejections; 0 retries until
    /// the environment settles.
    #[serde(default)]
    pub max_drift_retries: u32,
}

fn default_retry_backoff_secs() -> u64 {
    10
}

/// The fixed, side-effect-free reference workload run before and after every
/// measured test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    pub image: String,
    pub command: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultsConfig {
    pub dir: String,
    /// Render one SVG line chart per numeric column of each table.
    #[serde(default)]
    pub plot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: String,
    /// Skip targets whose outputs exist when the configuration is unchanged.
    #[serde(default = "default_auto_skip")]
    pub auto_skip: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            auto_skip: default_auto_skip(),
        }
    }
}

fn default_cache_path() -> String {
    "cache.json".into()
}

fn default_auto_skip() -> bool {
    true
}

/// One benchmark target: an already-built image and its entry command, both
/// opaque to the measurement core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub image: String,
    pub command: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.benchmark.sample_count > 0,
            "benchmark.sample_count must be > 0, got {}",
            self.benchmark.sample_count
        );
        anyhow::ensure!(
            self.benchmark.change_threshold_pct > 0.0,
            "benchmark.change_threshold_pct must be > 0, got {}",
            self.benchmark.change_threshold_pct
        );
        anyhow::ensure!(
            (0.01..=1.0).contains(&self.profile.cpu_quota_fraction),
            "profile.cpu_quota_fraction must be between 0.01 and 1.0, got {}",
            self.profile.cpu_quota_fraction
        );
        anyhow::ensure!(
            !self.calibration.image.is_empty(),
            "calibration.image must be non-empty"
        );
        anyhow::ensure!(
            !self.calibration.command.is_empty(),
            "calibration.command must be non-empty"
        );
        anyhow::ensure!(!self.results.dir.is_empty(), "results.dir must be non-empty");
        anyhow::ensure!(!self.cache.path.is_empty(), "cache.path must be non-empty");
        anyhow::ensure!(
            !self.targets.is_empty(),
            "at least one [[targets]] entry is required"
        );
        for (i, target) in self.targets.iter().enumerate() {
            anyhow::ensure!(
                !target.name.is_empty(),
                "targets[{}].name must be non-empty",
                i
            );
            anyhow::ensure!(
                !target.image.is_empty(),
                "targets[{}].image must be non-empty",
                i
            );
            anyhow::ensure!(
                !target.command.is_empty(),
                "targets[{}].command must be non-empty",
                i
            );
        }
        let mut names: Vec<&str> = self.targets.iter().map(|t| t.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        anyhow::ensure!(
            names.len() == self.targets.len(),
            "targets must have unique names (outputs are keyed by name)"
        );
        Ok(())
    }
}
