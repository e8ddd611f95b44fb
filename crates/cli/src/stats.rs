//! Server run statistics.

use std::time::Duration;

use dispatcher::DispatchStats;
use ingress::IngressReport;

/// Statistics from a server run
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerStats {
    /// Producer-side counters
    pub ingress: IngressReport,
    /// Dispatch-side counters
    pub dispatch: DispatchStats,
    /// Total run duration
    pub duration: Duration,
}

impl ServerStats {
    /// Combine the per-task reports into one summary.
    pub fn new(ingress: IngressReport, dispatch: DispatchStats, duration: Duration) -> Self {
        Self {
            ingress,
            dispatch,
            duration,
        }
    }

    /// Events dispatched per second over the run.
    pub fn events_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.dispatch.events_handled as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Run Summary ===\n");

        println!("Producer:");
        println!("  Lines read: {}", self.ingress.lines_read);
        println!("  Parse errors: {}", self.ingress.parse_errors);
        println!(
            "  Out-of-order arrivals: {}",
            self.ingress.reorder.out_of_order
        );
        println!(
            "  Discarded (stale/duplicate): {}/{}",
            self.ingress.reorder.stale_discarded, self.ingress.reorder.duplicate_discarded
        );
        println!(
            "  Peak reorder depth: {}",
            self.ingress.reorder.max_buffer_depth
        );

        println!("\nDispatch:");
        println!("  Events dispatched: {}", self.dispatch.events_handled);
        println!(
            "  Follow: {}  Unfollow: {}  Broadcast: {}  Private: {}  Status: {}",
            self.dispatch.follows,
            self.dispatch.unfollows,
            self.dispatch.broadcasts,
            self.dispatch.privates,
            self.dispatch.status_updates
        );
        println!("  Deliveries queued: {}", self.dispatch.deliveries_queued);
        println!(
            "  Dropped (queue full): {}",
            self.dispatch.deliveries_dropped_full
        );
        println!("  Clients forgotten: {}", self.dispatch.clients_forgotten);

        println!(
            "\nDuration: {:.2}s ({:.0} events/s)",
            self.duration.as_secs_f64(),
            self.events_per_sec()
        );
        println!();
    }
}
