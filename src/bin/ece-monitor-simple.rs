use std::process::ExitCode;

use clap::Parser;
use ece_health_reporter::cli::{self, CliArgs};
use ece_health_reporter::ReportStyle;

// Allocator memory and the deployment list only.
#[tokio::main]
async fn main() -> ExitCode {
    cli::init_tracing();
    let args = CliArgs::parse();
    cli::run(args, ReportStyle::Simple).await
}
