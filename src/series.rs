// Runs the sampler N times for one target, strictly sequentially

use crate::config::TargetConfig;
use crate::executor::{ResourceProfile, WorkloadSpec};
use crate::models::SampleSeries;
use crate::sampler::{SampleError, Sampler};
use tracing::info;

pub struct SeriesRunner<'a> {
    sampler: &'a Sampler<'a>,
}

impl<'a> SeriesRunner<'a> {
    pub fn new(sampler: &'a Sampler<'a>) -> Self {
        Self { sampler }
    }

    /// Collect `sample_count` accepted samples for one target. Iterations
    /// run one after another; each calibration-measurement-calibration
    /// bracket must be temporally isolated from its neighbors for drift
    /// attribution to hold.
    pub async fn run_series(
        &self,
        target: &TargetConfig,
        profile: &ResourceProfile,
        sample_count: usize,
    ) -> Result<SampleSeries, SampleError> {
        info!(
            test = %target.name,
            samples = sample_count,
            "Running test"
        );
        let workload = WorkloadSpec::new(target.image.as_str(), target.command.as_str());
        let mut series = SampleSeries::new();
        for current in 1..=sample_count {
            info!("Starting test: {}/{}", current, sample_count);
            let sample = self
                .sampler
                .run_sample(&target.name, &workload, profile, current, sample_count)
                .await?;
            series.push(sample);
        }
        Ok(series)
    }
}
