use anyhow::{Context, Result};
use isobench::cache::RunCache;
use isobench::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    tracing::info!("{} v{}", version::NAME, version::VERSION);

    let app_config = config::AppConfig::load()?;

    let host = hostinfo::collect();
    tracing::info!(
        cpu = %host.cpu_model,
        physical_cores = host.physical_cores,
        logical_cores = host.logical_cores,
        total_memory_bytes = host.total_memory_bytes,
        os = %host.os,
        "host"
    );

    tracing::info!("Getting docker client");
    let executor = executor::WorkloadExecutor::connect()
        .await
        .context("could not connect to docker daemon")?;

    let backoff = Duration::from_secs(app_config.benchmark.retry_backoff_secs);
    let probe = calibration::CalibrationProbe::new(
        &executor,
        executor::WorkloadSpec::new(
            app_config.calibration.image.as_str(),
            app_config.calibration.command.as_str(),
        ),
        backoff,
    );
    let sampler = sampler::Sampler::new(
        &executor,
        &probe,
        sampler::SamplerSettings {
            change_threshold_pct: app_config.benchmark.change_threshold_pct,
            retry_backoff: backoff,
            max_drift_retries: app_config.benchmark.max_drift_retries,
        },
    );
    let runner = series::SeriesRunner::new(&sampler);
    let writer = results::ResultsWriter::new(&app_config.results.dir, app_config.results.plot);
    writer.ensure_layout()?;

    // Read the previous run's configuration, then persist the current one
    // before any target runs.
    let current_key = cache::CacheKey::from_config(&app_config);
    let mut run_cache = cache::FileCache::new(&app_config.cache.path);
    let persisted = run_cache.get();
    run_cache.put(&current_key)?;

    for target in &app_config.targets {
        let paths = writer.target_paths(&target.name);
        let outputs_exist = paths.first_csv.exists() && paths.overall_csv.exists();
        if app_config.cache.auto_skip
            && cache::should_skip(persisted.as_ref(), &current_key, outputs_exist)
        {
            tracing::info!(test = %target.name, "Test already run. Skipping. (FROM AUTO_SKIP)");
            continue;
        }

        let series = runner
            .run_series(target, &app_config.profile, app_config.benchmark.sample_count)
            .await
            .with_context(|| format!("benchmarking {} failed", target.name))?;

        let (time_series, summary) = analysis::aggregate(&series);
        writer
            .write_tables(&target.name, &time_series, &summary)
            .await?;
    }

    Ok(())
}
