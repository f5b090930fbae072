// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod parsing;
pub mod client;
pub mod metrics;
pub mod collector;
pub mod report;
pub mod output;
pub mod runner;
pub mod cli;

// Re-export commonly used items
pub use types::*;
pub use error::{ApiError, ConfigError, ErrorKind, RunError};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, FileEnvironment, LayeredEnvironment, MockEnvironment};
pub use parsing::{mb_to_gb, usage_percent, format_bytes, NameFilter};
pub use client::CloudApiClient;
pub use metrics::*;
pub use collector::MetricsCollector;
pub use report::{HealthReport, ReportSummary};
pub use output::save_metrics_to_file;
pub use runner::{run, run_with_env, RunOutcome};
