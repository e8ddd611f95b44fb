//! Producer ingest: framed lines -> parse -> reorder -> dispatch channel.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use contracts::Event;
use reorderer::{ReorderStats, Reorderer};

use crate::error::IngressError;

/// Counters from a producer session.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngressReport {
    /// Lines read from the producer socket.
    pub lines_read: u64,
    /// Lines that parsed into events.
    pub events_accepted: u64,
    /// Lines dropped as malformed.
    pub parse_errors: u64,
    /// Reorderer discard accounting.
    pub reorder: ReorderStats,
    /// Sequence the reorderer was waiting on when the stream ended.
    pub final_cursor: u64,
}

/// Accept one producer connection and pump its event stream until EOF.
///
/// Parsed events go through the reorderer and are forwarded, strictly in
/// sequence, on `dispatch_tx`. Malformed lines are logged and dropped;
/// they never occupy a sequence slot. Returning (and dropping the
/// sender) is what tells the dispatcher the stream is over.
#[instrument(name = "event_ingress", skip_all)]
pub async fn run_event_ingress(
    listener: TcpListener,
    dispatch_tx: mpsc::Sender<Event>,
) -> Result<IngressReport, IngressError> {
    let (stream, peer) = listener
        .accept()
        .await
        .map_err(|e| IngressError::accept("event", e))?;
    info!(%peer, "event source connected");

    let mut lines = BufReader::new(stream).lines();
    let mut reorderer = Reorderer::new();
    let mut report = IngressReport::default();

    while let Some(line) = lines.next_line().await? {
        report.lines_read += 1;
        metrics::counter!("eventfan_events_received_total").increment(1);

        let event = match Event::parse(&line) {
            Ok(event) => event,
            Err(e) => {
                report.parse_errors += 1;
                metrics::counter!("eventfan_event_parse_errors_total").increment(1);
                warn!(error = %e, "dropping malformed event line");
                continue;
            }
        };

        report.events_accepted += 1;
        reorderer.submit(event);

        while let Some(ready) = reorderer.next_ready() {
            if dispatch_tx.send(ready).await.is_err() {
                warn!("dispatch channel closed, stopping event ingest");
                return Ok(finish(report, &reorderer));
            }
        }
    }

    if !reorderer.is_empty() {
        debug!(
            pending = reorderer.pending_len(),
            waiting_on = reorderer.next_seq(),
            "event stream ended with a sequence gap"
        );
    }
    info!(lines = report.lines_read, "event source disconnected");

    Ok(finish(report, &reorderer))
}

fn finish(mut report: IngressReport, reorderer: &Reorderer) -> IngressReport {
    report.reorder = reorderer.stats();
    report.final_cursor = reorderer.next_seq();
    report
}
