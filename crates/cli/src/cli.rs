//! CLI argument definitions using clap.

use std::net::IpAddr;

use clap::{Parser, Subcommand, ValueEnum};

/// eventfan - sequenced event fan-out server
#[derive(Parser, Debug)]
#[command(
    name = "eventfan",
    author,
    version,
    about = "Sequenced event fan-out server",
    long_about = "Accepts a single producer stream of sequenced events, restores \n\
                  strict sequence order, and routes each event to connected \n\
                  clients according to follow relationships."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "EVENTFAN_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "EVENTFAN_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the fan-out server
    Serve(ServeArgs),
}

/// Arguments for the `serve` command
#[derive(Parser, Debug, Clone)]
pub struct ServeArgs {
    /// Address both listeners bind on
    #[arg(long, default_value = "127.0.0.1", env = "EVENTFAN_HOST")]
    pub host: IpAddr,

    /// Port for the producer event stream
    #[arg(long, default_value_t = 9090, env = "EVENT_PORT")]
    pub event_port: u16,

    /// Port for client connections
    #[arg(long, default_value_t = 9099, env = "CLIENT_PORT")]
    pub client_port: u16,

    /// Enable debug-level logging (same as -v)
    #[arg(long, env = "DEBUG")]
    pub debug: bool,

    /// Per-client send queue capacity
    #[arg(long, default_value_t = 64, env = "EVENTFAN_CLIENT_QUEUE")]
    pub client_queue: usize,

    /// Capacity of the reorderer-to-dispatcher channel
    #[arg(long, default_value_t = 256, env = "EVENTFAN_DISPATCH_BUFFER")]
    pub dispatch_buffer: usize,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value_t = 0, env = "EVENTFAN_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
