//! Presentation-layer state machine for the project detail page.
//!
//! `ProjectPage` owns the local UI state: the selected section, staged
//! files and text, the "accepting new drops" flag, the current project
//! snapshot, and the last notification. All persistence goes through the
//! submission orchestrator; the page only gates actions and folds results
//! and progress events back into its state.
//!
//! The confirm flow is split so callers can pump progress events while the
//! submission runs: `begin_confirm` drains the staged input and returns the
//! batch, the orchestrator futures run to completion, `finish_confirm`
//! applies both results. `confirm` packages the three steps for callers
//! that do not need live progress.

pub mod clipboard;
pub mod notification;

use crate::api::{BlobStore, ProjectStore};
use crate::error::AppError;
use crate::models::{DisplayRow, FileDeliverable, Party, PendingFile, ProjectSnapshot};
use crate::services::progress::{EventSender, SubmissionEvent};
use crate::services::reconciler;
use crate::services::submission::SubmissionOrchestrator;

use clipboard::Clipboard;
use notification::Notification;

/// The two mutually exclusive view sections of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Description,
    Submission,
}

/// Staged input drained by `begin_confirm`, ready to hand to the
/// orchestrator. `snapshot` is the pre-batch view the slot indices are
/// computed against.
#[derive(Debug)]
pub struct ConfirmBatch {
    pub files: Vec<PendingFile>,
    pub text: String,
    pub snapshot: ProjectSnapshot,
}

pub struct ProjectPage {
    project_id: String,
    /// Host used to build the shareable page link.
    host: String,
    section: Section,
    snapshot: ProjectSnapshot,
    staged_files: Vec<PendingFile>,
    staged_text: String,
    accepting_drops: bool,
    notification: Option<Notification>,
}

impl ProjectPage {
    pub fn new(
        project_id: impl Into<String>,
        host: impl Into<String>,
        snapshot: ProjectSnapshot,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            host: host.into(),
            section: Section::Description,
            snapshot,
            staged_files: Vec::new(),
            staged_text: String::new(),
            accepting_drops: true,
            notification: None,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn section(&self) -> Section {
        self.section
    }

    pub fn snapshot(&self) -> &ProjectSnapshot {
        &self.snapshot
    }

    pub fn accepting_drops(&self) -> bool {
        self.accepting_drops
    }

    pub fn staged_text(&self) -> &str {
        &self.staged_text
    }

    pub fn staged_file_count(&self) -> usize {
        self.staged_files.len()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn take_notification(&mut self) -> Option<Notification> {
        self.notification.take()
    }

    /// Which party the project is waiting on, for the description header.
    pub fn awaiting(&self) -> Party {
        self.snapshot.details.status.awaiting()
    }

    pub fn submission_available(&self) -> bool {
        self.snapshot.details.status.accepts_submissions()
    }

    /// Switch sections. The submission section is refused while the
    /// project status sits in the excluded set.
    pub fn select_section(&mut self, section: Section) -> bool {
        if section == Section::Submission && !self.submission_available() {
            return false;
        }
        self.section = section;
        true
    }

    /// Stage dropped files. Ignored while a batch is in flight.
    pub fn stage_files(&mut self, files: Vec<PendingFile>) {
        if self.accepting_drops {
            self.staged_files.extend(files);
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.staged_text = text.into();
    }

    /// Confirm is enabled once there is at least one staged file or a
    /// non-empty text.
    pub fn can_confirm(&self) -> bool {
        !self.staged_files.is_empty() || !self.staged_text.is_empty()
    }

    /// The unified deliverable list: persisted entries first, staged files
    /// appended, recomputed from current state on every call.
    pub fn display_rows(&self) -> Vec<DisplayRow> {
        reconciler::display_rows(&self.snapshot.file_deliverables, &self.staged_files)
    }

    /// Start a confirmed submission: drain the staged input, stop accepting
    /// drops, and add in-flight slots for the batch. Returns `None` when
    /// there is nothing to submit or a batch is already running.
    pub fn begin_confirm(&mut self) -> Option<ConfirmBatch> {
        if !self.can_confirm() || !self.accepting_drops {
            return None;
        }
        self.accepting_drops = false;

        // Slot indices are computed against the pre-batch snapshot.
        let snapshot = self.snapshot.clone();
        let files = std::mem::take(&mut self.staged_files);
        for file in &files {
            self.snapshot
                .file_deliverables
                .push(FileDeliverable::in_flight(
                    file.file_name.clone(),
                    file.file_size(),
                ));
        }
        Some(ConfirmBatch {
            files,
            text: self.staged_text.clone(),
            snapshot,
        })
    }

    /// Fold a progress or completion event into the deliverable list.
    /// Progress for a slot that already carries a URL is ignored, as are
    /// events for slots outside the current list.
    pub fn apply_event(&mut self, event: SubmissionEvent) {
        match event {
            SubmissionEvent::FileProgress { slot, progress } => {
                if let Some(deliverable) = self.snapshot.file_deliverables.get_mut(slot) {
                    if deliverable.download_url.is_none() {
                        deliverable.progress = Some(progress);
                    }
                }
            }
            SubmissionEvent::FileCompleted { slot, download_url } => {
                if let Some(deliverable) = self.snapshot.file_deliverables.get_mut(slot) {
                    deliverable.download_url = Some(download_url);
                    deliverable.progress = None;
                }
            }
        }
    }

    /// Apply the joined results of the file and text submissions. Surfaces
    /// success only when both resolved; otherwise classifies the failure.
    /// Always ends with a notification set and drops accepting again.
    pub fn finish_confirm(
        &mut self,
        file_result: crate::error::Result<Option<ProjectSnapshot>>,
        text_result: crate::error::Result<Option<ProjectSnapshot>>,
    ) {
        // Restored unconditionally, even after a partial failure.
        self.accepting_drops = true;

        let not_approved = matches!(file_result, Err(AppError::NotApproved))
            || matches!(text_result, Err(AppError::NotApproved));
        let failed = file_result.is_err() || text_result.is_err();

        if !failed {
            // The file batch persists its merged list after the (fast) text
            // append, so its resync is the fresher view and must win; the
            // text snapshot may predate the file persist entirely.
            if let Ok(Some(snapshot)) = text_result {
                self.snapshot = snapshot;
            }
            if let Ok(Some(snapshot)) = file_result {
                self.snapshot = snapshot;
            }
            self.staged_text.clear();
            self.notification = Some(Notification::submission_success());
            return;
        }

        if not_approved {
            // Nothing was uploaded; discard all staged input including the
            // optimistic in-flight slots.
            self.staged_text.clear();
            self.snapshot
                .file_deliverables
                .retain(|d| d.download_url.is_some());
            self.notification = Some(Notification::not_approved());
        } else {
            // Upload or store failure: keep whatever local progress the
            // slots accumulated (nothing was persisted remotely) and the
            // typed text for a retry.
            self.notification = Some(Notification::submission_failed());
        }
    }

    /// Run the whole confirm flow without live progress pumping.
    pub async fn confirm<S: ProjectStore, B: BlobStore>(
        &mut self,
        orchestrator: &SubmissionOrchestrator<S, B>,
        events: EventSender,
    ) {
        let Some(batch) = self.begin_confirm() else {
            return;
        };
        let (file_result, text_result) = tokio::join!(
            orchestrator.upload_files(&self.project_id, &batch.snapshot, batch.files, events),
            orchestrator.upload_text(&self.project_id, &batch.snapshot, &batch.text),
        );
        self.finish_confirm(file_result, text_result);
    }

    /// Shareable link to this page.
    pub fn share_link(&self) -> String {
        format!("http://{}/project/{}", self.host, self.project_id)
    }

    /// Copy the page link to the clipboard. Best-effort: a clipboard
    /// failure is swallowed and raises no notification.
    pub fn copy_share_link(&mut self, clipboard: &mut impl Clipboard) {
        let link = self.share_link();
        if clipboard.write_text(&link).is_ok() {
            self.notification = Some(Notification::link_copied());
        }
    }
}
