//! Dispatcher - routes in-order events to client send queues

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{Event, EventKind, UserId};

use crate::graph::FollowGraph;
use crate::registry::{ClientRegistry, DeliveryStatus};

/// Counters accumulated over a dispatcher run.
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchStats {
    /// Events handled, equal to the highest sequence reached.
    pub events_handled: u64,
    pub follows: u64,
    pub unfollows: u64,
    pub broadcasts: u64,
    pub privates: u64,
    pub status_updates: u64,
    /// Deliveries accepted onto a client queue.
    pub deliveries_queued: u64,
    /// Deliveries dropped because a client queue was full.
    pub deliveries_dropped_full: u64,
    /// Clients forgotten after their send queue closed.
    pub clients_forgotten: u64,
}

/// Consumes in-order events, mutates the follow graph, and fans out to
/// client send queues.
///
/// The dispatcher owns the follow graph exclusively; the registry is
/// shared with the acceptor. `handle` runs once per sequence, in order,
/// and never blocks on a client socket.
pub struct Dispatcher {
    graph: FollowGraph,
    registry: ClientRegistry,
    input_rx: mpsc::Receiver<Event>,
    stats: DispatchStats,
}

impl Dispatcher {
    /// Create a dispatcher reading in-order events from `input_rx`.
    pub fn new(registry: ClientRegistry, input_rx: mpsc::Receiver<Event>) -> Self {
        Self {
            graph: FollowGraph::new(),
            registry,
            input_rx,
            stats: DispatchStats::default(),
        }
    }

    /// Run the dispatch loop.
    ///
    /// Returns the run's counters when the input channel closes.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> DispatchStats {
        info!("dispatcher started");

        while let Some(event) = self.input_rx.recv().await {
            self.handle(event);
        }

        info!(
            events = self.stats.events_handled,
            deliveries = self.stats.deliveries_queued,
            "dispatcher input closed, shutting down"
        );
        self.stats
    }

    /// Spawn the dispatcher as a background task.
    pub fn spawn(self) -> JoinHandle<DispatchStats> {
        tokio::spawn(self.run())
    }

    /// Route one event per the kind's routing rule.
    fn handle(&mut self, event: Event) {
        self.stats.events_handled += 1;
        metrics::counter!("eventfan_events_dispatched_total", "kind" => event.kind().code())
            .increment(1);
        debug!(
            sequence = event.sequence(),
            kind = event.kind().code(),
            "dispatching event"
        );

        match event.kind() {
            EventKind::Follow { from, to } => {
                self.stats.follows += 1;
                // Notify first: the recipient sees the event itself, not
                // graph state from a later sequence.
                self.deliver(to, &event);
                self.graph.follow(from, to);
            }
            EventKind::Unfollow { from, to } => {
                self.stats.unfollows += 1;
                self.graph.unfollow(from, to);
            }
            EventKind::Broadcast => {
                self.stats.broadcasts += 1;
                for user_id in self.registry.snapshot() {
                    self.deliver(user_id, &event);
                }
            }
            EventKind::Private { to, .. } => {
                self.stats.privates += 1;
                self.deliver(to, &event);
            }
            EventKind::StatusUpdate { from } => {
                self.stats.status_updates += 1;
                for user_id in self.graph.followers_of(from) {
                    self.deliver(user_id, &event);
                }
            }
        }
    }

    fn deliver(&mut self, user_id: UserId, event: &Event) {
        match self.registry.deliver(user_id, event) {
            DeliveryStatus::Queued => {
                self.stats.deliveries_queued += 1;
                metrics::counter!("eventfan_deliveries_total", "kind" => event.kind().code())
                    .increment(1);
            }
            DeliveryStatus::QueueFull => {
                self.stats.deliveries_dropped_full += 1;
                metrics::counter!("eventfan_deliveries_dropped_total", "reason" => "queue_full")
                    .increment(1);
            }
            DeliveryStatus::Closed { token } => {
                // The worker died on a write error; drop that registration
                // (token-guarded, so a concurrent reconnect under the same
                // id survives) and keep going with the other recipients.
                self.stats.clients_forgotten += 1;
                self.registry.forget_token(user_id, token);
                metrics::counter!("eventfan_deliveries_dropped_total", "reason" => "closed")
                    .increment(1);
                warn!(
                    user_id,
                    sequence = event.sequence(),
                    "client send queue closed, forgetting client"
                );
            }
            DeliveryStatus::NotRegistered => {
                metrics::counter!("eventfan_deliveries_dropped_total", "reason" => "not_registered")
                    .increment(1);
                debug!(
                    user_id,
                    sequence = event.sequence(),
                    "recipient not registered, nothing delivered"
                );
            }
        }
    }
}
