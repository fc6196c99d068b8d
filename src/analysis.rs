// Fold an accepted sample series into the first-run time series and the
// per-iteration summary.

use crate::models::{SampleSeries, SummaryRow, TimeSeriesRow};
use tracing::warn;

/// Derive both tabular views from one series. An empty series produces two
/// empty tables and a warning; nothing is raised and nothing is written.
pub fn aggregate(series: &SampleSeries) -> (Vec<TimeSeriesRow>, Vec<SummaryRow>) {
    if series.is_empty() {
        warn!("No test data collected.");
        return (Vec::new(), Vec::new());
    }
    (first_run_rows(series), overall_rows(series))
}

/// The first sample's telemetry, one row per snapshot in chronological
/// order, with per-core counters collapsed to their mean.
fn first_run_rows(series: &SampleSeries) -> Vec<TimeSeriesRow> {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    first
        .telemetry
        .iter()
        .map(|snap| TimeSeriesRow {
            timestamp: snap.timestamp.to_rfc3339(),
            cpu_total_usage: snap.cpu_total_usage,
            cpu_user_usage: snap.cpu_user_usage,
            cpu_kernel_usage: snap.cpu_kernel_usage,
            avg_per_core_usage: mean(&snap.per_core_usage),
            memory_usage_bytes: snap.memory_usage_bytes.unwrap_or(0),
            memory_max_usage_bytes: snap.memory_max_usage_bytes.unwrap_or(0),
            memory_cache_bytes: snap.memory_cache_bytes.unwrap_or(0),
        })
        .collect()
}

/// One row per sample in iteration order. Telemetry-derived fields fall back
/// to 0 for samples whose stream produced nothing; only the normalization
/// divides, and the baseline is a positive measured duration by
/// construction.
fn overall_rows(series: &SampleSeries) -> Vec<SummaryRow> {
    series
        .iter()
        .map(|sample| {
            let max_cpu_usage = sample
                .telemetry
                .iter()
                .map(|s| s.cpu_total_usage)
                .max()
                .unwrap_or(0);
            let memory: Vec<u64> = sample
                .telemetry
                .iter()
                .map(|s| s.memory_usage_bytes.unwrap_or(0))
                .collect();
            let max_memory_usage = sample
                .telemetry
                .iter()
                .map(|s| s.memory_max_usage_bytes.unwrap_or(0))
                .max()
                .unwrap_or(0);
            SummaryRow {
                iteration: sample.iteration,
                max_cpu_usage,
                avg_memory_usage: mean(&memory),
                max_memory_usage,
                measured_duration: sample.measured_duration,
                calibration_baseline: sample.calibration_baseline,
                normalized_duration: sample.measured_duration / sample.calibration_baseline,
            }
        })
        .collect()
}

fn mean(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<u64>() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_slice_is_zero() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn mean_of_values() {
        assert_eq!(mean(&[100, 300]), 200.0);
        assert_eq!(mean(&[7]), 7.0);
    }
}
