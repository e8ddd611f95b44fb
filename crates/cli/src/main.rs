//! # eventfan CLI
//!
//! Command line entry point.
//!
//! Provides:
//! - Environment and flag based configuration
//! - Logging setup
//! - Graceful shutdown handling

use anyhow::Result;
use clap::Parser;
use tracing::info;

use eventfan::cli::{Cli, Commands};
use eventfan::commands::run_serve;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on CLI options
    init_logging(&cli)?;

    info!(version = env!("CARGO_PKG_VERSION"), "eventfan starting");

    let result = match &cli.command {
        Commands::Serve(args) => run_serve(args).await,
    };

    if let Err(ref e) = result {
        tracing::error!(error = %e, "command failed");
    }

    result
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    let debug = match &cli.command {
        Commands::Serve(args) => args.debug,
    };

    let default_log_level = if cli.quiet {
        "warn"
    } else if cli.verbose >= 2 {
        "trace"
    } else if cli.verbose == 1 || debug {
        "debug"
    } else {
        "info"
    };

    observability::init(observability::ObservabilityConfig {
        log_format: cli.log_format.into(),
        default_log_level: default_log_level.to_string(),
        metrics_port: None,
    })
}
