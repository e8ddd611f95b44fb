//! Gap-filling reorderer over the producer's sequence numbers.

use std::collections::{BinaryHeap, HashSet};

use contracts::Event;
use tracing::trace;

use crate::heap::PendingEvent;

/// Discard accounting over a reorderer's lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReorderStats {
    /// Events already below the cursor at submit time.
    pub stale_discarded: u64,
    /// Duplicates of a still-buffered sequence, discarded at submit.
    pub duplicate_discarded: u64,
    /// Events that arrived with a lower sequence than an earlier submission.
    pub out_of_order: u64,
    /// Largest number of events buffered at once.
    pub max_buffer_depth: usize,
}

/// Restores strictly increasing sequence order starting at 1.
///
/// `submit` buffers an event; `drain` then yields every event whose
/// sequence matches the cursor, advancing the cursor per yield, and
/// stops at the first gap. The buffer is bounded by the current gap
/// width, not by the sequence domain.
#[derive(Debug)]
pub struct Reorderer {
    /// The sequence the dispatcher needs next.
    next_seq: u64,
    pending: BinaryHeap<PendingEvent>,
    /// Sequences currently in `pending`; buffered sequences stay unique.
    buffered: HashSet<u64>,
    last_submitted: Option<u64>,
    stats: ReorderStats,
}

impl Reorderer {
    /// Create a reorderer with its cursor at sequence 1.
    pub fn new() -> Self {
        Self {
            next_seq: 1,
            pending: BinaryHeap::new(),
            buffered: HashSet::new(),
            last_submitted: None,
            stats: ReorderStats::default(),
        }
    }

    /// Buffer an event.
    ///
    /// Returns `false` when the event was discarded: its sequence is
    /// below the cursor (already delivered), or that sequence is already
    /// buffered (the later arrival loses).
    pub fn submit(&mut self, event: Event) -> bool {
        let seq = event.sequence();

        if let Some(last) = self.last_submitted {
            if seq < last {
                self.stats.out_of_order += 1;
            }
        }
        self.last_submitted = Some(seq);

        if seq < self.next_seq {
            self.stats.stale_discarded += 1;
            metrics::counter!("eventfan_reorder_discards_total", "reason" => "stale").increment(1);
            trace!(sequence = seq, cursor = self.next_seq, "discarding stale event");
            return false;
        }

        if !self.buffered.insert(seq) {
            self.stats.duplicate_discarded += 1;
            metrics::counter!("eventfan_reorder_discards_total", "reason" => "duplicate")
                .increment(1);
            trace!(sequence = seq, "discarding duplicate of a buffered sequence");
            return false;
        }

        self.pending.push(PendingEvent(event));
        if self.pending.len() > self.stats.max_buffer_depth {
            self.stats.max_buffer_depth = self.pending.len();
        }
        metrics::gauge!("eventfan_reorder_buffer_depth").set(self.pending.len() as f64);
        true
    }

    /// Pop the next in-order event, if the cursor's sequence is buffered.
    pub fn next_ready(&mut self) -> Option<Event> {
        let seq = self.pending.peek()?.sequence();
        if seq != self.next_seq {
            return None;
        }
        let entry = self.pending.pop()?;
        self.buffered.remove(&seq);
        self.next_seq = seq + 1;
        metrics::gauge!("eventfan_reorder_buffer_depth").set(self.pending.len() as f64);
        Some(entry.0)
    }

    /// Iterator yielding ready events until the next gap.
    pub fn drain(&mut self) -> Drain<'_> {
        Drain { reorderer: self }
    }

    /// The sequence the next drained event will carry.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Number of buffered events waiting on a gap.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Discard accounting so far.
    pub fn stats(&self) -> ReorderStats {
        self.stats
    }
}

impl Default for Reorderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Draining iterator returned by [`Reorderer::drain`].
pub struct Drain<'a> {
    reorderer: &'a mut Reorderer,
}

impl Iterator for Drain<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.reorderer.next_ready()
    }
}
