//! Deliverable state reconciler.
//!
//! Merges the persisted file deliverables with locally staged files into
//! one ordered display list. Pure projection — no input mutation, cheap
//! enough to recompute on every view refresh.

use crate::models::{DisplayRow, FileDeliverable, PendingFile, RowState};

/// Produce the unified display sequence: the persisted deliverables first,
/// in their original order, tagged `Uploaded`; then the staged files in
/// selection order, tagged `Waiting` with an empty URL and no progress.
pub fn display_rows(persisted: &[FileDeliverable], pending: &[PendingFile]) -> Vec<DisplayRow> {
    let mut rows = Vec::with_capacity(persisted.len() + pending.len());
    for deliverable in persisted {
        rows.push(DisplayRow {
            name: deliverable.file_name.clone(),
            size: deliverable.file_size,
            state: RowState::Uploaded,
            download_url: deliverable.download_url.clone().unwrap_or_default(),
            progress: deliverable.progress,
        });
    }
    for file in pending {
        rows.push(DisplayRow {
            name: file.file_name.clone(),
            size: file.file_size(),
            state: RowState::Waiting,
            download_url: String::new(),
            progress: None,
        });
    }
    rows
}
