//! # Observability
//!
//! Tracing initialization and the optional Prometheus exporter.
//!
//! Business crates record through the `metrics` facade inline; this
//! crate only installs the subscriber and the recorder. Metric names
//! carry the `eventfan_` prefix:
//!
//! - `eventfan_events_received_total`
//! - `eventfan_event_parse_errors_total`
//! - `eventfan_events_dispatched_total{kind}`
//! - `eventfan_deliveries_total{kind}`
//! - `eventfan_deliveries_dropped_total{reason}`
//! - `eventfan_reorder_discards_total{reason}`
//! - `eventfan_reorder_buffer_depth`
//! - `eventfan_clients_connected`

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Log output format
#[derive(Debug, Clone, Copy, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log output format
    pub log_format: LogFormat,
    /// Level directive used when `RUST_LOG` is unset
    pub default_log_level: String,
    /// Prometheus port (None = disabled)
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            default_log_level: "info".to_string(),
            metrics_port: None,
        }
    }
}

/// Initialize tracing and, when configured, the Prometheus exporter.
pub fn init(config: ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_log_level));

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer().pretty().boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    if let Some(port) = config.metrics_port {
        init_metrics_only(port)?;
    }

    tracing::info!(
        log_format = ?config.log_format,
        metrics_port = ?config.metrics_port,
        "observability initialized"
    );
    Ok(())
}

/// Install only the Prometheus recorder.
///
/// For the case where tracing was already initialized by the caller.
pub fn init_metrics_only(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("failed to install prometheus recorder")?;

    tracing::info!(port, "prometheus metrics endpoint initialized");
    Ok(())
}
