// One SVG line chart per numeric column, value against sample index.

use crate::models::{SummaryRow, TimeSeriesRow};
use plotters::prelude::*;
use std::path::Path;
use tracing::{info, warn};

/// Charts for the first-run table; the timestamp column is the x axis and
/// gets no chart of its own.
pub fn render_time_series(
    dir: &Path,
    base_name: &str,
    rows: &[TimeSeriesRow],
) -> anyhow::Result<()> {
    if rows.is_empty() {
        warn!("Found empty dataframe");
        return Ok(());
    }
    let columns: Vec<(&str, Vec<f64>)> = vec![
        (
            "cpu_total_usage",
            rows.iter().map(|r| r.cpu_total_usage as f64).collect(),
        ),
        (
            "cpu_user_usage",
            rows.iter().map(|r| r.cpu_user_usage as f64).collect(),
        ),
        (
            "cpu_kernel_usage",
            rows.iter().map(|r| r.cpu_kernel_usage as f64).collect(),
        ),
        (
            "avg_per_core_usage",
            rows.iter().map(|r| r.avg_per_core_usage).collect(),
        ),
        (
            "memory_usage_bytes",
            rows.iter().map(|r| r.memory_usage_bytes as f64).collect(),
        ),
        (
            "memory_max_usage_bytes",
            rows.iter()
                .map(|r| r.memory_max_usage_bytes as f64)
                .collect(),
        ),
        (
            "memory_cache_bytes",
            rows.iter().map(|r| r.memory_cache_bytes as f64).collect(),
        ),
    ];
    render_columns(dir, base_name, "sample", &columns)
}

/// Charts for the overall table; iteration is the x axis.
pub fn render_summary(dir: &Path, base_name: &str, rows: &[SummaryRow]) -> anyhow::Result<()> {
    if rows.is_empty() {
        warn!("Found empty dataframe");
        return Ok(());
    }
    let columns: Vec<(&str, Vec<f64>)> = vec![
        (
            "max_cpu_usage",
            rows.iter().map(|r| r.max_cpu_usage as f64).collect(),
        ),
        (
            "avg_memory_usage",
            rows.iter().map(|r| r.avg_memory_usage).collect(),
        ),
        (
            "max_memory_usage",
            rows.iter().map(|r| r.max_memory_usage as f64).collect(),
        ),
        (
            "measured_duration",
            rows.iter().map(|r| r.measured_duration).collect(),
        ),
        (
            "calibration_baseline",
            rows.iter().map(|r| r.calibration_baseline).collect(),
        ),
        (
            "normalized_duration",
            rows.iter().map(|r| r.normalized_duration).collect(),
        ),
    ];
    render_columns(dir, base_name, "iteration", &columns)
}

fn render_columns(
    dir: &Path,
    base_name: &str,
    x_label: &str,
    columns: &[(&str, Vec<f64>)],
) -> anyhow::Result<()> {
    for (column, values) in columns {
        let out = dir.join(format!("{}_{}.svg", base_name, column));
        info!(path = %out.display(), "Writing plot");
        if out.exists() {
            std::fs::remove_file(&out)?;
        }
        draw_line_chart(&out, &format!("{}_{}", base_name, column), x_label, column, values)?;
    }
    Ok(())
}

fn draw_line_chart(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    values: &[f64],
) -> anyhow::Result<()> {
    let root = SVGBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow::anyhow!("filling chart background: {}", e))?;

    let x_max = values.len().saturating_sub(1).max(1) as f64;
    let (mut y_min, mut y_max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });
    if !y_min.is_finite() || !y_max.is_finite() {
        y_min = 0.0;
        y_max = 1.0;
    }
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..x_max, y_min..y_max)
        .map_err(|e| anyhow::anyhow!("building chart {}: {}", title, e))?;
    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .draw()
        .map_err(|e| anyhow::anyhow!("drawing mesh for {}: {}", title, e))?;
    chart
        .draw_series(LineSeries::new(
            values.iter().enumerate().map(|(i, v)| (i as f64, *v)),
            &BLUE,
        ))
        .map_err(|e| anyhow::anyhow!("drawing series for {}: {}", title, e))?;
    root.present()
        .map_err(|e| anyhow::anyhow!("writing {}: {}", path.display(), e))?;
    Ok(())
}
