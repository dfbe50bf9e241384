//! Newline-delimited JSON event feed from the host proxy
//!
//! One [`HostEvent`] per line. Lines that do not parse (including lines
//! that are not UTF-8) are skipped; a storage error aborts only the event
//! it happened in.

use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

use crate::event::HostEvent;
use crate::gateway::PersistenceGateway;
use crate::processor::{EventProcessor, Recorded};

/// Counters for one drained feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub requests: usize,
    pub responses: usize,
    pub tls_failures: usize,
    /// Lines that were not a valid event
    pub malformed: usize,
    /// Events aborted by a storage error
    pub failed: usize,
}

impl IngestStats {
    fn count(&mut self, recorded: Recorded) {
        match recorded {
            Recorded::TlsFailure(_) => self.tls_failures += 1,
            Recorded::Request(_) => self.requests += 1,
            Recorded::Response { .. } => self.responses += 1,
        }
    }
}

/// Feed every event from `reader` through `processor` until EOF or `shutdown`
///
/// `shutdown` is only observed while waiting for the next line, so an event
/// that has started recording always runs to completion.
pub async fn drain_events<G, R, S>(
    processor: &EventProcessor<G>,
    mut reader: R,
    shutdown: S,
) -> std::io::Result<IngestStats>
where
    G: PersistenceGateway,
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut stats = IngestStats::default();
    let mut line = Vec::new();
    let mut line_no = 0usize;

    loop {
        line.clear();
        let read = tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Stopping event feed after line {}", line_no);
                break;
            }
            read = reader.read_until(b'\n', &mut line) => read?,
        };
        if read == 0 {
            break;
        }
        line_no += 1;

        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let event: HostEvent = match serde_json::from_slice(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!("Skipping malformed event on line {}: {}", line_no, e);
                stats.malformed += 1;
                continue;
            }
        };

        let kind = event.kind();
        match processor.handle(event).await {
            Ok(recorded) => stats.count(recorded),
            Err(e) => {
                error!("Failed to record {} event on line {}: {}", kind, line_no, e);
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
