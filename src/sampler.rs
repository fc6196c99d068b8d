// One measurement iteration: calibrate, measure with live telemetry,
// calibrate again, then accept the sample or discard and retry on drift.

use crate::calibration::CalibrationProbe;
use crate::executor::{ExecutorError, ResourceProfile, WorkloadExecutor, WorkloadSpec};
use crate::models::{ExitStatus, ResourceSnapshot, Sample};
use futures_util::{Stream, StreamExt};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error("environment drifted past {threshold_pct}% on {attempts} consecutive attempts")]
    DriftRetriesExhausted { attempts: u32, threshold_pct: f64 },
}

#[derive(Debug, Clone)]
pub struct SamplerSettings {
    pub change_threshold_pct: f64,
    pub retry_backoff: Duration,
    /// 0 retries until the environment settles.
    pub max_drift_retries: u32,
}

pub struct Sampler<'a> {
    executor: &'a WorkloadExecutor,
    probe: &'a CalibrationProbe<'a>,
    settings: SamplerSettings,
}

impl<'a> Sampler<'a> {
    pub fn new(
        executor: &'a WorkloadExecutor,
        probe: &'a CalibrationProbe<'a>,
        settings: SamplerSettings,
    ) -> Self {
        Self {
            executor,
            probe,
            settings,
        }
    }

    /// Produce one accepted sample for the given 1-based iteration. The
    /// iteration number does not advance across internal drift retries; a
    /// rejected attempt's durations and telemetry are discarded wholesale.
    pub async fn run_sample(
        &self,
        name: &str,
        workload: &WorkloadSpec,
        profile: &ResourceProfile,
        iteration: usize,
        total: usize,
    ) -> Result<Sample, SampleError> {
        let mut attempts: u32 = 0;
        loop {
            let before = self.probe.probe(profile).await?;

            info!(test = %name, "Running test");
            let running = self.executor.start(workload, profile).await?;
            let mut telemetry_stream = running.telemetry();
            let telemetry = drain_telemetry(&mut telemetry_stream).await;
            drop(telemetry_stream);
            let run = running.finish().await?;

            info!(
                test = %name,
                "Test: {}/{} {}",
                iteration,
                total,
                if run.exit.is_success() { "passed" } else { "FAILED" }
            );
            if let Some(console) = run.console.as_deref() {
                warn!(test = %name, "test output:\n{}", console);
            }

            let after = self.probe.probe(profile).await?;

            let drift = drift_percent(before, after);
            if exceeds_threshold(drift, self.settings.change_threshold_pct) {
                attempts += 1;
                if self.settings.max_drift_retries > 0 && attempts >= self.settings.max_drift_retries
                {
                    return Err(SampleError::DriftRetriesExhausted {
                        attempts,
                        threshold_pct: self.settings.change_threshold_pct,
                    });
                }
                info!(
                    "System seems to have changed by: {:.4}%. Retrying test after timeout.",
                    drift
                );
                tokio::time::sleep(self.settings.retry_backoff).await;
                continue;
            }

            info!("Saving results");
            return Ok(build_sample(
                iteration,
                run.exit,
                run.duration.as_secs_f64(),
                before,
                after,
                telemetry,
            ));
        }
    }
}

/// Relative change between the two calibration durations, as a percentage of
/// the first.
pub fn drift_percent(before: f64, after: f64) -> f64 {
    ((after - before) / before) * 100.0
}

/// Equality counts as drift: the accept region is open at the threshold.
pub fn exceeds_threshold(drift_pct: f64, threshold_pct: f64) -> bool {
    drift_pct >= threshold_pct
}

/// Collect readings until the stream ends or the first zero sentinel, which
/// is discarded. Nothing past a sentinel is ever read.
pub async fn drain_telemetry<S>(stream: &mut S) -> Vec<ResourceSnapshot>
where
    S: Stream<Item = ResourceSnapshot> + Unpin,
{
    let mut collected = Vec::new();
    while let Some(snapshot) = stream.next().await {
        if snapshot.is_stream_end() {
            break;
        }
        collected.push(snapshot);
    }
    collected
}

/// Assemble an accepted sample, renumbering the 1-based iteration to the
/// 0-based position stored on the sample.
pub fn build_sample(
    iteration: usize,
    exit_status: ExitStatus,
    measured_duration: f64,
    before: f64,
    after: f64,
    telemetry: Vec<ResourceSnapshot>,
) -> Sample {
    Sample {
        iteration: iteration - 1,
        exit_status,
        measured_duration,
        calibration_baseline: (before + after) / 2.0,
        telemetry,
    }
}
