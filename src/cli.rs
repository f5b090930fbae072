use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use crate::config::load_config;
use crate::error::RunError;
use crate::runner::{self, RunOutcome};
use crate::types::{Config, ReportStyle};

/// Collect ECE platform, allocator and deployment health.
///
/// Settings come from the environment and a dotenv file (HOST, API_KEY or
/// USERNAME/PASSWORD, VERIFY_SSL, OUTPUT_FILE, DEPLOYMENT_FILTER,
/// REQUEST_TIMEOUT_SECONDS); flags override them.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct CliArgs {
    /// Key-value configuration file (defaults to ./.env when present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only inspect deployments whose name matches this wildcard
    #[arg(short, long, value_name = "GLOB")]
    pub filter: Option<String>,

    /// Write the JSON dump here instead of OUTPUT_FILE
    #[arg(short, long, value_name = "PATH", conflicts_with = "no_output")]
    pub output: Option<String>,

    /// Do not write the JSON dump
    #[arg(long)]
    pub no_output: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    pub insecure: bool,
}

impl CliArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(filter) = &self.filter {
            config.deployment_filter = filter.clone();
        }
        if self.no_output {
            config.output_file = None;
        } else if let Some(output) = &self.output {
            config.output_file = Some(output.clone());
        }
        if self.insecure {
            config.verify_ssl = false;
        }
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Shared entry point of both binaries.
pub async fn run(args: CliArgs, style: ReportStyle) -> ExitCode {
    let result = load_and_run(&args, style).await;
    log_outcome(&result);
    ExitCode::from(runner::exit_code(&result))
}

fn log_outcome(result: &Result<RunOutcome, RunError>) {
    match result {
        Ok(RunOutcome::Complete) => {}
        Ok(RunOutcome::Partial { failures }) => {
            error!("Run completed with {} failed sections or deployments", failures);
        }
        Err(e) => error!("{}", e),
    }
}

async fn load_and_run(args: &CliArgs, style: ReportStyle) -> Result<RunOutcome, RunError> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply(&mut config);
    runner::run(&config, style, &mut io::stdout()).await
}
