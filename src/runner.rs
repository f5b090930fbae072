use std::io::Write;
use std::path::Path;

use tracing::{error, info};

use crate::client::CloudApiClient;
use crate::collector::MetricsCollector;
use crate::config::{load_config_with_env, EnvironmentProvider};
use crate::error::RunError;
use crate::output::save_metrics_to_file;
use crate::report::HealthReport;
use crate::types::{Config, MetricsSnapshot, ReportStyle};

pub const EXIT_OK: u8 = 0;
pub const EXIT_FATAL: u8 = 1;
pub const EXIT_PARTIAL: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Complete,
    /// The report was produced but some sections or deployments failed.
    Partial { failures: usize },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            RunOutcome::Complete => EXIT_OK,
            RunOutcome::Partial { .. } => EXIT_PARTIAL,
        }
    }
}

pub fn exit_code(result: &Result<RunOutcome, RunError>) -> u8 {
    match result {
        Ok(outcome) => outcome.exit_code(),
        Err(_) => EXIT_FATAL,
    }
}

pub async fn collect_snapshot(config: &Config) -> Result<MetricsSnapshot, RunError> {
    let client = CloudApiClient::new(config)?;
    let collector = MetricsCollector::new(&client, config)?;
    Ok(collector.collect().await?)
}

/// Collect, print the report to `out`, then dump JSON if configured.
/// Nothing is written to `out` when the run aborts.
pub async fn run<W: Write>(config: &Config, style: ReportStyle, out: &mut W) -> Result<RunOutcome, RunError> {
    info!(
        "Starting metrics collection for host: {} (auth: {})",
        config.host,
        config.credentials.scheme()
    );
    let snapshot = collect_snapshot(config).await?;

    let report = HealthReport::new(&snapshot);
    out.write_all(report.render(style).as_bytes())?;
    out.flush()?;

    if let Some(path) = &config.output_file {
        if let Err(e) = save_metrics_to_file(&snapshot, Path::new(path)) {
            error!("Could not write metrics to '{}': {:#}", path, e);
        }
    }

    let summary = report.summary();
    info!(
        "Collected {} deployments, {} failed",
        summary.deployment_count, summary.failed_count
    );
    if summary.has_failures() {
        Ok(RunOutcome::Partial {
            failures: summary.total_failures(),
        })
    } else {
        Ok(RunOutcome::Complete)
    }
}

/// Load configuration from `env` and run. Configuration errors surface
/// before any request is made.
pub async fn run_with_env<E: EnvironmentProvider, W: Write>(
    env: &E,
    style: ReportStyle,
    out: &mut W,
) -> Result<RunOutcome, RunError> {
    let config = load_config_with_env(env)?;
    run(&config, style, out).await
}
