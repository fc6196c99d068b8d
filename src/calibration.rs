// Calibration probe: the fixed reference workload bracketing every measured run

use crate::executor::{ExecutorError, ResourceProfile, WorkloadExecutor, WorkloadSpec};
use std::time::Duration;
use tracing::{info, warn};

pub struct CalibrationProbe<'a> {
    executor: &'a WorkloadExecutor,
    workload: WorkloadSpec,
    backoff: Duration,
}

impl<'a> CalibrationProbe<'a> {
    pub fn new(executor: &'a WorkloadExecutor, workload: WorkloadSpec, backoff: Duration) -> Self {
        Self {
            executor,
            workload,
            backoff,
        }
    }

    /// Run the reference workload until it exits cleanly and return its
    /// wall-clock duration in seconds. A failed reference run never yields a
    /// baseline; it is retried after the backoff, without bound. Executor
    /// errors propagate immediately.
    pub async fn probe(&self, profile: &ResourceProfile) -> Result<f64, ExecutorError> {
        loop {
            info!("Running standard benchmark");
            let run = self.executor.run(&self.workload, profile).await?;
            if run.exit.is_success() {
                return Ok(run.duration.as_secs_f64());
            }
            warn!(
                image = %self.workload.image,
                "Benchmark failed. Retrying after timeout."
            );
            tokio::time::sleep(self.backoff).await;
        }
    }
}
