//! Shared registry of connected clients.
//!
//! Written by the acceptor (register, forget-on-disconnect) and read by
//! the dispatcher (deliver, snapshot, forget-on-dead-queue). Backed by a
//! sharded concurrent map, so the acceptor can insert while dispatch is
//! in flight without a global lock.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use contracts::{Event, UserId};

use crate::handle::{ClientHandle, SendOutcome};

/// Outcome of a delivery attempt to one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Accepted onto the recipient's send queue.
    Queued,
    /// Recipient's queue was full; the event is dropped for them.
    QueueFull,
    /// Recipient's worker has exited. Carries the stale registration's
    /// token so eviction cannot hit a concurrent replacement.
    Closed { token: u64 },
    /// No client registered under this user id.
    NotRegistered,
}

/// Registry mapping user ids to live send handles.
///
/// Only the latest handle registered under a user id is retained.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<DashMap<UserId, ClientHandle>>,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-or-replace a client handle.
    ///
    /// A displaced handle is dropped: its queue closes, the old worker
    /// drains what was already queued, then closes the old socket.
    pub fn register(&self, handle: ClientHandle) {
        let user_id = handle.user_id();
        let replaced = self.clients.insert(user_id, handle).is_some();
        metrics::gauge!("eventfan_clients_connected").set(self.clients.len() as f64);
        if replaced {
            info!(user_id, "client re-registered, displacing previous connection");
        } else {
            info!(user_id, "client registered");
        }
    }

    /// Try to enqueue `event` for `user_id` without blocking.
    pub fn deliver(&self, user_id: UserId, event: &Event) -> DeliveryStatus {
        match self.clients.get(&user_id) {
            None => DeliveryStatus::NotRegistered,
            Some(handle) => match handle.try_send(event.clone()) {
                SendOutcome::Queued => DeliveryStatus::Queued,
                SendOutcome::QueueFull => DeliveryStatus::QueueFull,
                SendOutcome::Closed => DeliveryStatus::Closed {
                    token: handle.token(),
                },
            },
        }
    }

    /// Remove a client unconditionally. Idempotent.
    pub fn forget(&self, user_id: UserId) {
        if self.clients.remove(&user_id).is_some() {
            metrics::gauge!("eventfan_clients_connected").set(self.clients.len() as f64);
            debug!(user_id, "client forgotten");
        }
    }

    /// Remove a client only if its registration still carries `token`.
    ///
    /// Used by the disconnect watcher so an old connection's EOF cannot
    /// evict a replacement registered under the same user id.
    pub fn forget_token(&self, user_id: UserId, token: u64) -> bool {
        let removed = self
            .clients
            .remove_if(&user_id, |_, handle| handle.token() == token)
            .is_some();
        if removed {
            metrics::gauge!("eventfan_clients_connected").set(self.clients.len() as f64);
            debug!(user_id, "client disconnected");
        }
        removed
    }

    /// Ids of every currently registered client.
    ///
    /// Taken at the entry of Broadcast and StatusUpdate handling, so a
    /// client joining or leaving mid-event only affects later events.
    pub fn snapshot(&self) -> Vec<UserId> {
        self.clients.iter().map(|entry| *entry.key()).collect()
    }

    /// Whether a client is registered under `user_id`.
    pub fn contains(&self, user_id: UserId) -> bool {
        self.clients.contains_key(&user_id)
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if no clients are registered.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Remove every client and wait for each worker to flush and exit.
    pub async fn shutdown_all(&self) {
        let user_ids = self.snapshot();
        for user_id in user_ids {
            if let Some((_, handle)) = self.clients.remove(&user_id) {
                handle.shutdown().await;
            }
        }
        metrics::gauge!("eventfan_clients_connected").set(0.0);
    }
}
