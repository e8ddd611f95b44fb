//! ClientSink trait - dispatcher output interface
//!
//! Defines the abstract interface for per-client send sinks.

use crate::{RelayError, UserId};

/// Byte-oriented writer tied to one client connection.
///
/// All writes for a client are serialized through a single worker task,
/// so implementations never see concurrent calls.
#[trait_variant::make(ClientSink: Send)]
pub trait LocalClientSink {
    /// User id this sink was registered under (used for logging/metrics).
    fn user_id(&self) -> UserId;

    /// Write one event line. The implementation appends the LF framing.
    ///
    /// # Errors
    /// Returns a write error; the caller treats the sink as dead.
    async fn send(&mut self, line: &[u8]) -> Result<(), RelayError>;

    /// Close the underlying connection.
    async fn close(&mut self) -> Result<(), RelayError>;
}
