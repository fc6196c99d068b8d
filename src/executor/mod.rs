// Workload execution in throttled containers via bollard

mod stats;

use crate::models::{ExitStatus, ResourceSnapshot};
use bollard::Docker;
use bollard::container::LogOutput;
use bollard::query_parameters::{
    CreateContainerOptions, LogsOptions, RemoveContainerOptions, StartContainerOptions,
    StatsOptions, WaitContainerOptions,
};
use bollard::models::{ContainerCreateBody, HostConfig};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;

/// One scheduling period for the CFS quota, microseconds.
const CPU_PERIOD_US: i64 = 100_000;

/// Buffered snapshots between the stats forwarder task and the consumer.
const TELEMETRY_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The daemon cannot be reached at all. Nothing measured from here on
    /// can be trusted, so this aborts the whole run.
    #[error("container runtime unreachable: {0}")]
    Unreachable(#[source] bollard::errors::Error),
    #[error("container runtime request failed: {0}")]
    Runtime(#[from] bollard::errors::Error),
    #[error("container wait stream ended without reporting a status")]
    WaitEnded,
}

/// Throttling applied identically to calibration and measured runs, so drift
/// reflects the environment rather than a configuration difference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProfile {
    /// Fraction of one core's time made available. Kept deliberately low to
    /// stretch the run and give the stats feed time to report.
    pub cpu_quota_fraction: f64,
    /// Restrict to a single logical core to remove cross-core scheduling
    /// noise.
    #[serde(default)]
    pub pinned_core: Option<u32>,
}

impl ResourceProfile {
    pub(crate) fn host_config(&self) -> HostConfig {
        HostConfig {
            cpu_period: Some(CPU_PERIOD_US),
            cpu_quota: Some((self.cpu_quota_fraction * CPU_PERIOD_US as f64) as i64),
            cpuset_cpus: self.pinned_core.map(|core| core.to_string()),
            ..Default::default()
        }
    }
}

/// An image reference plus its entry command. Both are opaque strings
/// supplied by configuration; the command is split on whitespace.
#[derive(Debug, Clone)]
pub struct WorkloadSpec {
    pub image: String,
    pub command: String,
}

impl WorkloadSpec {
    pub fn new(image: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            command: command.into(),
        }
    }

    fn command_argv(&self) -> Vec<String> {
        self.command.split_whitespace().map(String::from).collect()
    }
}

/// Result of one finished container run.
#[derive(Debug)]
pub struct CompletedRun {
    pub exit: ExitStatus,
    pub duration: Duration,
    /// Console output, captured only when the workload failed.
    pub console: Option<String>,
}

pub struct WorkloadExecutor {
    docker: Docker,
}

impl WorkloadExecutor {
    /// Connects to the Docker daemon and pings it. An unreachable daemon is
    /// fatal for the whole benchmarking session.
    pub async fn connect() -> Result<Self, ExecutorError> {
        let docker = Docker::connect_with_unix_defaults().map_err(ExecutorError::Unreachable)?;
        docker.ping().await.map_err(ExecutorError::Unreachable)?;
        Ok(Self { docker })
    }

    /// Create, start, wait, remove. No telemetry; this is the calibration
    /// path.
    pub async fn run(
        &self,
        workload: &WorkloadSpec,
        profile: &ResourceProfile,
    ) -> Result<CompletedRun, ExecutorError> {
        let running = self.start(workload, profile).await?;
        running.finish().await
    }

    /// Start a container and hand back a handle for the measured path: the
    /// caller drains telemetry while the workload runs, then calls
    /// `finish`. The wall clock starts when the container starts.
    pub async fn start(
        &self,
        workload: &WorkloadSpec,
        profile: &ResourceProfile,
    ) -> Result<RunningWorkload, ExecutorError> {
        let body = ContainerCreateBody {
            image: Some(workload.image.clone()),
            cmd: Some(workload.command_argv()),
            tty: Some(true),
            host_config: Some(profile.host_config()),
            ..Default::default()
        };
        let created = self
            .docker
            .create_container(None::<CreateContainerOptions>, body)
            .await?;
        self.docker
            .start_container(&created.id, None::<StartContainerOptions>)
            .await?;
        Ok(RunningWorkload {
            docker: self.docker.clone(),
            id: created.id,
            started: Instant::now(),
        })
    }
}

/// A started container. Exactly one execution context lives per call; it is
/// torn down by `finish` before the next call begins.
pub struct RunningWorkload {
    docker: Docker,
    id: String,
    started: Instant,
}

impl RunningWorkload {
    /// Open the live telemetry feed. The stream is lazy, finite and
    /// non-restartable; drop it (or drain it to the end) before `finish`.
    pub fn telemetry(&self) -> TelemetryStream {
        TelemetryStream::open(self.docker.clone(), self.id.clone())
    }

    /// Wait for exit, capture console output on failure, remove the
    /// container, report status and wall-clock duration.
    pub async fn finish(self) -> Result<CompletedRun, ExecutorError> {
        let exit = self.wait_for_exit().await?;
        let duration = self.started.elapsed();

        let console = if exit.is_success() {
            None
        } else {
            Some(self.collect_console().await)
        };

        self.docker
            .remove_container(
                &self.id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;

        Ok(CompletedRun {
            exit,
            duration,
            console,
        })
    }

    async fn wait_for_exit(&self) -> Result<ExitStatus, ExecutorError> {
        let mut wait = self
            .docker
            .wait_container(&self.id, None::<WaitContainerOptions>);
        match wait.next().await {
            Some(Ok(response)) => Ok(ExitStatus::from_code(response.status_code)),
            // bollard reports a non-zero exit code as a stream error; that is
            // a measurement result here, not a runtime failure.
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => {
                Ok(ExitStatus::from_code(code))
            }
            Some(Err(e)) => Err(ExecutorError::Runtime(e)),
            None => Err(ExecutorError::WaitEnded),
        }
    }

    async fn collect_console(&self) -> String {
        let options = LogsOptions {
            stdout: true,
            stderr: true,
            ..Default::default()
        };
        let mut logs = self.docker.logs(&self.id, Some(options));
        let mut out = String::new();
        while let Some(chunk) = logs.next().await {
            match chunk {
                Ok(line) => out.push_str(&String::from_utf8_lossy(&line.into_bytes())),
                Err(e) => {
                    warn!(error = %e, container = %self.id, "failed to read container logs");
                    break;
                }
            }
        }
        out
    }
}

/// Lazy sequence of ResourceSnapshot readings backed by the runtime's stats
/// feed. Conversion from raw responses happens here; sentinel detection does
/// not, since the consumer decides when the stream has ended. A forwarder
/// task owns the underlying feed, so dropping this stream tears it down.
pub struct TelemetryStream {
    rx: mpsc::Receiver<ResourceSnapshot>,
}

impl TelemetryStream {
    fn open(docker: Docker, id: String) -> Self {
        let (tx, rx) = mpsc::channel(TELEMETRY_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let options = StatsOptions {
                stream: true,
                ..Default::default()
            };
            let mut stream = docker.stats(&id, Some(options));
            while let Some(result) = stream.next().await {
                match result {
                    Ok(raw) => {
                        if tx.send(stats::process_snapshot(&raw)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, container = %id, "stats stream error");
                        break;
                    }
                }
            }
        });
        Self { rx }
    }
}

impl Stream for TelemetryStream {
    type Item = ResourceSnapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
