//! Upload progress bookkeeping.
//!
//! Raw transfer events from a blob store are folded into fractional slot
//! progress (0–100) and re-emitted as `SubmissionEvent`s. Progress for a
//! slot is monotonically non-decreasing until its terminal `FileCompleted`
//! event, which is always sent after the last progress event for that slot.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::api::TransferEvent;

/// Upper bound of fractional progress.
pub const MAX_PROGRESS: f64 = 100.0;

/// Fractional progress for a transfer. A zero-byte transfer reports 100.
pub fn percent(bytes_transferred: u64, total_bytes: u64) -> f64 {
    if total_bytes == 0 {
        return MAX_PROGRESS;
    }
    ((bytes_transferred as f64 / total_bytes as f64) * MAX_PROGRESS).min(MAX_PROGRESS)
}

/// Monotonic progress for one deliverable slot. Late or reordered transfer
/// events can never make reported progress go backwards.
#[derive(Debug, Default)]
pub struct SlotProgress {
    last: f64,
}

impl SlotProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in a transfer event, returning the progress to report.
    pub fn update(&mut self, event: TransferEvent) -> f64 {
        let pct = percent(event.bytes_transferred, event.total_bytes);
        if pct > self.last {
            self.last = pct;
        }
        self.last
    }

    pub fn current(&self) -> f64 {
        self.last
    }
}

/// Event stream produced by a submission batch, consumed by the
/// presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SubmissionEvent {
    /// Latest fractional progress for the deliverable at `slot`.
    FileProgress { slot: usize, progress: f64 },
    /// The deliverable at `slot` finished uploading; progress is cleared
    /// and the retrieval URL attached.
    FileCompleted { slot: usize, download_url: String },
}

pub type EventSender = mpsc::UnboundedSender<SubmissionEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<SubmissionEvent>;

/// Convenience constructor for a submission event channel.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
