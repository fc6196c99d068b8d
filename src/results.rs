// Materializes the two tables as CSV files (plus optional plots) under the
// results directory.

use crate::models::{SummaryRow, TimeSeriesRow};
use crate::plot;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where one target's outputs land.
#[derive(Debug, Clone)]
pub struct TargetPaths {
    pub first_csv: PathBuf,
    pub overall_csv: PathBuf,
    pub first_figures: PathBuf,
    pub overall_figures: PathBuf,
}

pub struct ResultsWriter {
    root: PathBuf,
    plot: bool,
}

impl ResultsWriter {
    pub fn new(root: impl Into<PathBuf>, plot: bool) -> Self {
        Self {
            root: root.into(),
            plot,
        }
    }

    pub fn target_paths(&self, name: &str) -> TargetPaths {
        let tables = self.root.join("tables");
        TargetPaths {
            first_csv: tables.join(format!("first_{}.csv", name)),
            overall_csv: tables.join(format!("overall_{}.csv", name)),
            first_figures: self.root.join("figures").join("first"),
            overall_figures: self.root.join("figures").join("overall"),
        }
    }

    /// Create the whole output tree. Safe to call when it already exists.
    pub fn ensure_layout(&self) -> anyhow::Result<()> {
        let dirs = [
            self.root.clone(),
            self.root.join("tables"),
            self.root.join("figures").join("first"),
            self.root.join("figures").join("overall"),
        ];
        for dir in dirs {
            debug!(dir = %dir.display(), "Making results directory");
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(())
    }

    /// Write both tables for one target. The two writes only share the
    /// read-only rows, so they run concurrently. An empty summary means the
    /// series produced nothing: directories are created, nothing is
    /// written.
    pub async fn write_tables(
        &self,
        name: &str,
        time_series: &[TimeSeriesRow],
        summary: &[SummaryRow],
    ) -> anyhow::Result<()> {
        self.ensure_layout()?;
        if summary.is_empty() {
            warn!(test = %name, "No test results collected.");
            return Ok(());
        }

        let paths = self.target_paths(name);

        let first_rows = time_series.to_vec();
        let first_path = paths.first_csv.clone();
        let overall_rows = summary.to_vec();
        let overall_path = paths.overall_csv.clone();

        info!(test = %name, "Writing first run info");
        info!(test = %name, "Writing overall run data");
        let (first, overall) = tokio::join!(
            tokio::task::spawn_blocking(move || write_csv(&first_path, &first_rows)),
            tokio::task::spawn_blocking(move || write_csv(&overall_path, &overall_rows)),
        );
        first.context("first-run writer panicked")??;
        overall.context("overall writer panicked")??;

        if self.plot {
            plot::render_time_series(&paths.first_figures, &format!("first_{}", name), time_series)?;
            plot::render_summary(&paths.overall_figures, &format!("overall_{}", name), summary)?;
        }
        Ok(())
    }
}

fn write_csv<T: serde::Serialize>(path: &Path, rows: &[T]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
