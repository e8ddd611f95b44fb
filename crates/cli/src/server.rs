//! Server orchestrator - binds the listeners and wires the pipeline.
//!
//! One ingress task reads the producer; one acceptor task registers
//! clients; one dispatcher task routes. The reorderer lives inside the
//! ingress task and needs no locking. The registry is the only state
//! shared across tasks.

use std::net::SocketAddr;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::info;

use contracts::Event;
use dispatcher::{ClientRegistry, Dispatcher};
use ingress::{run_client_acceptor, run_event_ingress, IngressError};

use crate::stats::ServerStats;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Producer event listener address
    pub event_addr: SocketAddr,
    /// Client listener address
    pub client_addr: SocketAddr,
    /// Per-client send queue capacity
    pub client_queue: usize,
    /// Capacity of the reorderer-to-dispatcher channel
    pub dispatch_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            event_addr: ([127, 0, 0, 1], 9090).into(),
            client_addr: ([127, 0, 0, 1], 9099).into(),
            client_queue: 64,
            dispatch_buffer: 256,
        }
    }
}

/// A bound, not-yet-running server.
pub struct Server {
    event_listener: TcpListener,
    client_listener: TcpListener,
    registry: ClientRegistry,
    config: ServerConfig,
}

impl Server {
    /// Bind both listeners.
    ///
    /// # Errors
    /// Failing to bind either listener is fatal; the binary exits
    /// non-zero.
    pub async fn bind(config: ServerConfig) -> Result<Self, IngressError> {
        let event_listener = ingress::bind("event", config.event_addr).await?;
        let client_listener = ingress::bind("client", config.client_addr).await?;
        Ok(Self {
            event_listener,
            client_listener,
            registry: ClientRegistry::new(),
            config,
        })
    }

    /// Actual listener addresses (useful after binding port 0).
    pub fn local_addrs(&self) -> std::io::Result<(SocketAddr, SocketAddr)> {
        Ok((
            self.event_listener.local_addr()?,
            self.client_listener.local_addr()?,
        ))
    }

    /// Handle on the shared client registry.
    pub fn registry(&self) -> ClientRegistry {
        self.registry.clone()
    }

    /// Run until the producer stream ends, then flush and shut down.
    ///
    /// Shutdown drains the dispatch channel, lets every client worker
    /// flush what was already queued, and closes every sink. The reorder
    /// buffer is not drained: a gap at end of stream stays undelivered.
    pub async fn run(self) -> Result<ServerStats> {
        let started = Instant::now();
        let (event_addr, client_addr) = self.local_addrs()?;
        info!(%event_addr, %client_addr, "server listening");

        let (dispatch_tx, dispatch_rx) = mpsc::channel::<Event>(self.config.dispatch_buffer);

        let dispatcher_handle = Dispatcher::new(self.registry.clone(), dispatch_rx).spawn();
        let mut acceptor_handle = tokio::spawn(run_client_acceptor(
            self.client_listener,
            self.registry.clone(),
            self.config.client_queue,
        ));

        let ingress_result = tokio::select! {
            report = run_event_ingress(self.event_listener, dispatch_tx) => report,
            acceptor = &mut acceptor_handle => {
                // The acceptor only ever returns on a fatal accept error.
                dispatcher_handle.abort();
                return match acceptor {
                    Ok(Err(e)) => Err(e).context("client acceptor failed"),
                    Ok(Ok(())) => Err(anyhow::anyhow!("client acceptor exited unexpectedly")),
                    Err(e) => Err(e).context("client acceptor panicked"),
                };
            }
        };
        let ingress_report = ingress_result.context("event ingress failed")?;

        // Producer stream is over: stop accepting, drain the dispatcher,
        // flush every client queue, close every sink.
        acceptor_handle.abort();
        let dispatch_stats = dispatcher_handle.await.context("dispatcher task failed")?;
        self.registry.shutdown_all().await;

        let stats = ServerStats::new(ingress_report, dispatch_stats, started.elapsed());
        info!(
            events = stats.dispatch.events_handled,
            deliveries = stats.dispatch.deliveries_queued,
            duration_secs = stats.duration.as_secs_f64(),
            "server shutdown complete"
        );
        Ok(stats)
    }
}
