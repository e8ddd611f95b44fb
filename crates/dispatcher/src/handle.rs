//! ClientHandle - per-client send queue and worker task

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use contracts::{ClientSink, Event, UserId};

use crate::metrics::ClientMetrics;

/// Outcome of a non-blocking enqueue onto a client's send queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Accepted onto the queue.
    Queued,
    /// Queue full; the event is dropped for this client.
    QueueFull,
    /// The worker has exited (dead socket); the handle should be forgotten.
    Closed,
}

/// Handle to a client's send worker.
///
/// The worker is the only writer to the client's socket, which is what
/// keeps per-client delivery in sequence order. Dropping the handle
/// closes the queue; the worker drains what was already queued, then
/// closes the sink.
pub struct ClientHandle {
    user_id: UserId,
    /// Distinguishes this registration from a later one under the same id.
    token: u64,
    tx: mpsc::Sender<Event>,
    metrics: Arc<ClientMetrics>,
    worker: JoinHandle<()>,
}

impl ClientHandle {
    /// Spawn the send worker for `sink`.
    pub fn spawn<S: ClientSink + Send + 'static>(
        token: u64,
        sink: S,
        queue_capacity: usize,
    ) -> Self {
        let user_id = sink.user_id();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(ClientMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker = tokio::spawn(async move {
            client_worker(sink, rx, worker_metrics).await;
        });

        Self {
            user_id,
            token,
            tx,
            metrics,
            worker,
        }
    }

    /// User id this handle is registered under.
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Registration token assigned by the acceptor.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// Current delivery counters.
    pub fn metrics(&self) -> &Arc<ClientMetrics> {
        &self.metrics
    }

    /// Enqueue an event without blocking.
    pub fn try_send(&self, event: Event) -> SendOutcome {
        match self.tx.try_send(event) {
            Ok(()) => {
                self.metrics.inc_queued();
                SendOutcome::Queued
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.metrics.inc_dropped();
                warn!(
                    user_id = self.user_id,
                    sequence = event.sequence(),
                    "client queue full, event dropped"
                );
                SendOutcome::QueueFull
            }
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::Closed,
        }
    }

    /// Close the queue and wait for the worker to flush and exit.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            warn!(user_id = self.user_id, error = ?e, "client worker panicked");
        }
    }
}

/// Worker task that drains the queue and writes to the sink.
///
/// A write failure terminates the worker; events still queued are lost
/// with the connection.
async fn client_worker<S: ClientSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<Event>,
    metrics: Arc<ClientMetrics>,
) {
    let user_id = sink.user_id();
    debug!(user_id, "client worker started");

    while let Some(event) = rx.recv().await {
        match sink.send(event.wire_line()).await {
            Ok(()) => {
                metrics.inc_delivered();
            }
            Err(e) => {
                metrics.inc_failures();
                warn!(
                    user_id,
                    sequence = event.sequence(),
                    error = %e,
                    "client write failed, dropping connection"
                );
                break;
            }
        }
    }

    if let Err(e) = sink.close().await {
        debug!(user_id, error = %e, "error closing client sink");
    }
    debug!(user_id, "client worker stopped");
}
