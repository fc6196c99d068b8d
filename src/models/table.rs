// Rows of the two tabular outputs; field order is the CSV column order

use serde::Serialize;

/// One row of the first-run view: a single telemetry snapshot from the
/// series' first sample with per-core usage collapsed to its mean.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesRow {
    /// RFC 3339 collection time.
    pub timestamp: String,
    pub cpu_total_usage: u64,
    pub cpu_user_usage: u64,
    pub cpu_kernel_usage: u64,
    pub avg_per_core_usage: f64,
    pub memory_usage_bytes: u64,
    pub memory_max_usage_bytes: u64,
    pub memory_cache_bytes: u64,
}

/// One row of the overall view: a whole sample reduced to its extremes plus
/// the drift-normalized duration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub iteration: usize,
    pub max_cpu_usage: u64,
    pub avg_memory_usage: f64,
    pub max_memory_usage: u64,
    pub measured_duration: f64,
    pub calibration_baseline: f64,
    /// measured_duration / calibration_baseline.
    pub normalized_duration: f64,
}
