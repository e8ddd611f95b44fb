//! # Ingress
//!
//! Socket plumbing around the core: the producer line ingest (accept one
//! event source; parse, reorder, forward in sequence) and the client
//! acceptor (id handshake, registration, disconnect watch). The core
//! crates never touch sockets; this crate owns them.

mod acceptor;
mod error;
mod producer;
mod sink;

pub use acceptor::run_client_acceptor;
pub use error::IngressError;
pub use producer::{run_event_ingress, IngressReport};
pub use sink::TcpClientSink;

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Bind a listener, tagging failures with the listener's role.
pub async fn bind(role: &'static str, addr: SocketAddr) -> Result<TcpListener, IngressError> {
    TcpListener::bind(addr)
        .await
        .map_err(|e| IngressError::bind(role, addr, e))
}
