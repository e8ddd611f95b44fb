//! `serve` command implementation.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ServeArgs;
use crate::server::{Server, ServerConfig};

/// Execute the `serve` command
pub async fn run_serve(args: &ServeArgs) -> Result<()> {
    // Metrics exporter (optional)
    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!(port = args.metrics_port, "metrics endpoint available");
    }

    let config = ServerConfig {
        event_addr: SocketAddr::new(args.host, args.event_port),
        client_addr: SocketAddr::new(args.host, args.client_port),
        client_queue: args.client_queue,
        dispatch_buffer: args.dispatch_buffer,
    };

    let server = Server::bind(config.clone())
        .await
        .context("failed to bind listeners")?;

    info!(
        event_addr = %config.event_addr,
        client_addr = %config.client_addr,
        "eventfan ready"
    );

    tokio::select! {
        result = server.run() => {
            let stats = result.context("server execution failed")?;
            stats.print_summary();
        }
        _ = setup_shutdown_signal() => {
            warn!("received shutdown signal, stopping server");
        }
    }

    info!("eventfan finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
