//! Min-heap ordering wrapper keyed on event sequence.

use std::cmp::Ordering;

use contracts::Event;

/// Wrapper for min-heap ordering by sequence
#[derive(Debug, Clone)]
pub(crate) struct PendingEvent(pub(crate) Event);

impl PendingEvent {
    pub(crate) fn sequence(&self) -> u64 {
        self.0.sequence()
    }
}

impl PartialEq for PendingEvent {
    fn eq(&self, other: &Self) -> bool {
        self.sequence() == other.sequence()
    }
}

impl Eq for PendingEvent {}

impl PartialOrd for PendingEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PendingEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap (lowest sequence first)
        other.sequence().cmp(&self.sequence())
    }
}
