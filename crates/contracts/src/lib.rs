//! # Contracts
//!
//! Interface contracts shared by every crate in the workspace: the event
//! wire model, the client sink trait, and the unified error type.
//! Business crates depend on this crate, never on each other's internals.
//!
//! ## Ordering model
//! Events carry a producer-assigned `sequence` (u64, starting at 1).
//! Everything downstream of the reorderer observes sequences in strictly
//! increasing order with no gaps and no repeats.

mod error;
mod event;
mod sink;

pub use error::*;
pub use event::*;
pub use sink::*;
