// Aggregation tests: first-run time series and overall summary derivation

use chrono::{TimeZone, Utc};
use isobench::analysis::aggregate;
use isobench::models::{ExitStatus, ResourceSnapshot, Sample, SampleSeries};

fn snapshot(cpu: u64, per_core: Vec<u64>, memory: u64, memory_max: u64) -> ResourceSnapshot {
    ResourceSnapshot {
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        cpu_total_usage: cpu,
        cpu_user_usage: cpu / 2,
        cpu_kernel_usage: cpu / 4,
        per_core_usage: per_core,
        memory_usage_bytes: Some(memory),
        memory_max_usage_bytes: Some(memory_max),
        memory_cache_bytes: Some(512),
    }
}

fn sample(iteration: usize, duration: f64, baseline: f64, telemetry: Vec<ResourceSnapshot>) -> Sample {
    Sample {
        iteration,
        exit_status: ExitStatus::Success,
        measured_duration: duration,
        calibration_baseline: baseline,
        telemetry,
    }
}

fn series_of(samples: Vec<Sample>) -> SampleSeries {
    let mut series = SampleSeries::new();
    for s in samples {
        series.push(s);
    }
    series
}

#[test]
fn empty_series_yields_two_empty_tables() {
    let (time_series, summary) = aggregate(&SampleSeries::new());
    assert!(time_series.is_empty());
    assert!(summary.is_empty());
}

#[test]
fn summary_has_one_row_per_sample_in_iteration_order() {
    let series = series_of(vec![
        sample(0, 1.0, 1.0, vec![snapshot(100, vec![100], 10, 10)]),
        sample(1, 1.2, 1.0, vec![snapshot(300, vec![300], 20, 20)]),
        sample(2, 0.9, 1.0, vec![snapshot(200, vec![200], 30, 30)]),
    ]);
    let (_, summary) = aggregate(&series);

    assert_eq!(summary.len(), 3);
    let iterations: Vec<usize> = summary.iter().map(|r| r.iteration).collect();
    assert_eq!(iterations, vec![0, 1, 2]);
    let max_cpu: Vec<u64> = summary.iter().map(|r| r.max_cpu_usage).collect();
    assert_eq!(max_cpu, vec![100, 300, 200]);
    let avg_memory: Vec<f64> = summary.iter().map(|r| r.avg_memory_usage).collect();
    assert_eq!(avg_memory, vec![10.0, 20.0, 30.0]);
    let normalized: Vec<f64> = summary.iter().map(|r| r.normalized_duration).collect();
    assert_eq!(normalized, vec![1.0, 1.2, 0.9]);
}

#[test]
fn normalized_duration_divides_measured_by_baseline() {
    let series = series_of(vec![sample(0, 10.0, 2.0, Vec::new())]);
    let (_, summary) = aggregate(&series);
    assert_eq!(summary[0].normalized_duration, 5.0);
}

#[test]
fn summary_falls_back_to_zero_for_empty_telemetry() {
    let series = series_of(vec![sample(0, 1.0, 1.0, Vec::new())]);
    let (_, summary) = aggregate(&series);
    assert_eq!(summary[0].max_cpu_usage, 0);
    assert_eq!(summary[0].avg_memory_usage, 0.0);
    assert_eq!(summary[0].max_memory_usage, 0);
    assert_eq!(summary[0].measured_duration, 1.0);
}

#[test]
fn summary_takes_max_over_telemetry_within_a_sample() {
    let series = series_of(vec![sample(
        0,
        2.0,
        1.0,
        vec![
            snapshot(100, vec![50, 50], 10, 64),
            snapshot(400, vec![200, 200], 30, 128),
            snapshot(250, vec![125, 125], 20, 96),
        ],
    )]);
    let (_, summary) = aggregate(&series);
    assert_eq!(summary[0].max_cpu_usage, 400);
    assert_eq!(summary[0].avg_memory_usage, 20.0);
    assert_eq!(summary[0].max_memory_usage, 128);
}

#[test]
fn time_series_comes_from_first_sample_only() {
    let series = series_of(vec![
        sample(0, 1.0, 1.0, vec![snapshot(10, vec![10], 1, 1), snapshot(20, vec![20], 2, 2)]),
        sample(1, 1.0, 1.0, vec![snapshot(99, vec![99], 9, 9)]),
    ]);
    let (time_series, _) = aggregate(&series);

    assert_eq!(time_series.len(), 2);
    assert_eq!(time_series[0].cpu_total_usage, 10);
    assert_eq!(time_series[1].cpu_total_usage, 20);
}

#[test]
fn time_series_averages_per_core_usage() {
    let series = series_of(vec![sample(
        0,
        1.0,
        1.0,
        vec![snapshot(400, vec![100, 300], 10, 10)],
    )]);
    let (time_series, _) = aggregate(&series);
    assert_eq!(time_series[0].avg_per_core_usage, 200.0);
}

#[test]
fn time_series_empty_when_first_sample_has_no_telemetry() {
    let series = series_of(vec![
        sample(0, 1.0, 1.0, Vec::new()),
        sample(1, 1.0, 1.0, vec![snapshot(50, vec![50], 5, 5)]),
    ]);
    let (time_series, summary) = aggregate(&series);
    assert!(time_series.is_empty());
    assert_eq!(summary.len(), 2);
}

#[test]
fn time_series_handles_missing_memory_fields() {
    let mut snap = snapshot(10, vec![10], 0, 0);
    snap.memory_usage_bytes = None;
    snap.memory_max_usage_bytes = None;
    snap.memory_cache_bytes = None;
    let series = series_of(vec![sample(0, 1.0, 1.0, vec![snap])]);
    let (time_series, _) = aggregate(&series);
    assert_eq!(time_series[0].memory_usage_bytes, 0);
    assert_eq!(time_series[0].memory_max_usage_bytes, 0);
    assert_eq!(time_series[0].memory_cache_bytes, 0);
}

#[test]
fn failed_sample_still_contributes_a_summary_row() {
    let mut failed = sample(0, 1.5, 1.0, vec![snapshot(100, vec![100], 10, 10)]);
    failed.exit_status = ExitStatus::Failure { code: 1 };
    let series = series_of(vec![failed]);
    let (_, summary) = aggregate(&series);
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].measured_duration, 1.5);
}
