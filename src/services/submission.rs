//! Submission orchestrator — drives the full lifecycle of a deliverable
//! submission: approval gate, one-time status transition, slot-indexed
//! concurrent uploads, merged persistence, and project resync.
//!
//! The orchestrator is stateless between calls. It takes the caller's
//! current `ProjectSnapshot` and hands back a fresh one after persistence;
//! it never mutates caller state. Live upload progress flows out through a
//! `SubmissionEvent` channel.

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::api::{BlobStore, ProjectStore};
use crate::error::AppError;
use crate::models::{
    PendingFile, ProjectDetails, ProjectPatch, ProjectSnapshot, ProjectStatus,
    StoreFileDeliverable,
};
use crate::services::progress::{EventSender, SlotProgress, SubmissionEvent};

/// Build the local view of a project for the given wallet.
pub fn snapshot_from(details: ProjectDetails, wallet: &str) -> ProjectSnapshot {
    let is_assigned = details.freelancer_address.as_deref() == Some(wallet);
    let file_deliverables = details
        .file_deliverable
        .clone()
        .unwrap_or_default()
        .into_iter()
        .map(Into::into)
        .collect();
    let text_deliverables = details.text_deliverable.clone().unwrap_or_default();
    ProjectSnapshot {
        details,
        is_assigned,
        file_deliverables,
        text_deliverables,
    }
}

pub struct SubmissionOrchestrator<S, B> {
    store: S,
    blobs: B,
    /// Wallet address of the current user; submission requires it to match
    /// the project's freelancer address.
    wallet: String,
}

impl<S: ProjectStore, B: BlobStore> SubmissionOrchestrator<S, B> {
    pub fn new(store: S, blobs: B, wallet: impl Into<String>) -> Self {
        Self {
            store,
            blobs,
            wallet: wallet.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Fetch the project and rebuild the local view: typed details,
    /// assignment flag, and both deliverable lists.
    pub async fn sync_project(&self, project_id: &str) -> crate::error::Result<ProjectSnapshot> {
        let (_raw, details) = self.store.fetch_project(project_id).await?;
        Ok(snapshot_from(details, &self.wallet))
    }

    /// On the very first deliverable submission, move the project to
    /// "Waiting for Payment" and re-fetch so the transition is observed
    /// before any upload starts. A no-op once any deliverable has been
    /// persisted.
    async fn ensure_waiting_for_payment(
        &self,
        project_id: &str,
        details: &ProjectDetails,
    ) -> crate::error::Result<()> {
        if details.has_any_deliverable() {
            return Ok(());
        }
        log::info!(
            "first deliverable for project {}: transitioning to Waiting for Payment",
            project_id
        );
        self.store
            .update_project(
                project_id,
                &ProjectPatch::status(ProjectStatus::WaitingForPayment),
            )
            .await?;
        self.store.fetch_project(project_id).await?;
        Ok(())
    }

    /// Upload a batch of staged files as deliverables.
    ///
    /// Uploads run concurrently, each targeting a stable slot index equal
    /// to the persisted-deliverable count plus its position in the batch.
    /// All uploads are allowed to settle; if any failed, the aggregate
    /// rejects with the first failure and nothing is persisted. On success
    /// the merged record list is persisted as one sparse update and the
    /// resynced snapshot is returned. An empty batch is a no-op (`None`).
    pub async fn upload_files(
        &self,
        project_id: &str,
        snapshot: &ProjectSnapshot,
        files: Vec<PendingFile>,
        events: EventSender,
    ) -> crate::error::Result<Option<ProjectSnapshot>> {
        if files.is_empty() {
            return Ok(None);
        }
        if !snapshot.is_assigned {
            return Err(AppError::NotApproved);
        }

        let batch_id = Uuid::new_v4().simple().to_string();
        log::info!(
            "submission batch {}: {} file(s) for project {}",
            batch_id,
            files.len(),
            project_id
        );

        self.ensure_waiting_for_payment(project_id, &snapshot.details)
            .await?;

        // Only fully uploaded entries ever reach the store; an in-flight
        // slot without a URL has nothing persistable yet.
        let prior: Vec<StoreFileDeliverable> = snapshot
            .file_deliverables
            .iter()
            .filter_map(|d| {
                d.download_url.clone().map(|download_url| StoreFileDeliverable {
                    file_name: d.file_name.clone(),
                    file_size: d.file_size,
                    download_url,
                })
            })
            .collect();
        let base = snapshot.file_deliverables.len();

        let uploads = files.into_iter().enumerate().map(|(offset, file)| {
            let events = events.clone();
            async move { self.upload_one(project_id, base + offset, file, events).await }
        });
        let settled = futures::future::join_all(uploads).await;

        let mut resolved = Vec::with_capacity(settled.len());
        let mut failure: Option<AppError> = None;
        for result in settled {
            match result {
                Ok(record) => resolved.push(record),
                Err(err) => {
                    log::error!("submission batch {}: {}", batch_id, err);
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
            }
        }
        if let Some(err) = failure {
            return Err(err);
        }

        let merged: Vec<StoreFileDeliverable> = prior.into_iter().chain(resolved).collect();
        self.store
            .update_project(project_id, &ProjectPatch::file_deliverables(merged))
            .await?;
        log::info!("submission batch {} persisted", batch_id);

        let refreshed = self.sync_project(project_id).await?;
        Ok(Some(refreshed))
    }

    /// Upload one file, forwarding its transfer events as monotonic slot
    /// progress. The terminal `FileCompleted` event is sent only after the
    /// forwarder has drained every progress event for the slot.
    async fn upload_one(
        &self,
        project_id: &str,
        slot: usize,
        file: PendingFile,
        events: EventSender,
    ) -> crate::error::Result<StoreFileDeliverable> {
        let key = format!("{}/{}", project_id, file.file_name);
        let file_name = file.file_name.clone();
        let file_size = file.file_size();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let forwarder_events = events.clone();
        let forwarder = tokio::spawn(async move {
            let mut progress = SlotProgress::new();
            while let Some(event) = rx.recv().await {
                let _ = forwarder_events.send(SubmissionEvent::FileProgress {
                    slot,
                    progress: progress.update(event),
                });
            }
        });

        let result = self.blobs.upload_blob(&key, file.payload, tx).await;
        // upload_blob dropped its sender on return; wait for the forwarder
        // so no progress event can trail the terminal event.
        let _ = forwarder.await;

        match result {
            Ok(download_url) => {
                let _ = events.send(SubmissionEvent::FileCompleted {
                    slot,
                    download_url: download_url.clone(),
                });
                Ok(StoreFileDeliverable {
                    file_name,
                    file_size,
                    download_url,
                })
            }
            Err(err) => Err(AppError::Upload {
                file_name,
                reason: err.to_string(),
            }),
        }
    }

    /// Append a text deliverable. Empty input is a no-op: no store call,
    /// no resync. Applies the same first-submission transition rule as
    /// file uploads, persists the full updated list, and resyncs.
    pub async fn upload_text(
        &self,
        project_id: &str,
        snapshot: &ProjectSnapshot,
        text: &str,
    ) -> crate::error::Result<Option<ProjectSnapshot>> {
        if text.is_empty() {
            return Ok(None);
        }
        if !snapshot.is_assigned {
            return Err(AppError::NotApproved);
        }

        self.ensure_waiting_for_payment(project_id, &snapshot.details)
            .await?;

        let mut texts = snapshot.text_deliverables.clone();
        texts.push(text.to_string());
        self.store
            .update_project(project_id, &ProjectPatch::text_deliverables(texts))
            .await?;
        log::info!("text deliverable persisted for project {}", project_id);

        let refreshed = self.sync_project(project_id).await?;
        Ok(Some(refreshed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::{MemoryBlobStore, MemoryProjectStore};
    use crate::services::progress::event_channel;

    const WALLET: &str = "0xlancer";

    fn sample_details() -> ProjectDetails {
        ProjectDetails {
            title: "Landing page".to_string(),
            detail: "Three sections".to_string(),
            deadline: "2026-09-30T00:00:00Z".to_string(),
            reward: 500.0,
            client_address: "0xclient".to_string(),
            freelancer_address: Some(WALLET.to_string()),
            status: ProjectStatus::WaitingForSubmission,
            file_deliverable: None,
            text_deliverable: None,
        }
    }

    async fn orchestrator_with(
        details: ProjectDetails,
    ) -> SubmissionOrchestrator<MemoryProjectStore, MemoryBlobStore> {
        let store = MemoryProjectStore::new();
        store.insert("p1", &details).await;
        SubmissionOrchestrator::new(store, MemoryBlobStore::new(), WALLET)
    }

    #[tokio::test]
    async fn snapshot_derives_assignment_from_wallet() {
        let snapshot = snapshot_from(sample_details(), WALLET);
        assert!(snapshot.is_assigned);
        let snapshot = snapshot_from(sample_details(), "0xsomeoneelse");
        assert!(!snapshot.is_assigned);
    }

    #[tokio::test]
    async fn first_file_batch_issues_exactly_one_status_transition() {
        let orch = orchestrator_with(sample_details()).await;
        let snapshot = orch.sync_project("p1").await.unwrap();
        let files = vec![
            PendingFile::new("a.zip", vec![1u8; 64]),
            PendingFile::new("b.zip", vec![2u8; 32]),
        ];
        let (events, _rx) = event_channel();
        let refreshed = orch
            .upload_files("p1", &snapshot, files, events)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(orch.store().status_update_count().await, 1);
        assert_eq!(refreshed.details.status, ProjectStatus::WaitingForPayment);
        assert_eq!(refreshed.file_deliverables.len(), 2);
        assert_eq!(refreshed.file_deliverables[0].file_name, "a.zip");
        assert_eq!(refreshed.file_deliverables[1].file_name, "b.zip");
    }

    #[tokio::test]
    async fn subsequent_batches_issue_no_status_transition() {
        let mut details = sample_details();
        details.status = ProjectStatus::WaitingForPayment;
        details.file_deliverable = Some(vec![StoreFileDeliverable {
            file_name: "old.zip".to_string(),
            file_size: 5,
            download_url: "memory://p1/old.zip".to_string(),
        }]);
        let orch = orchestrator_with(details).await;
        let snapshot = orch.sync_project("p1").await.unwrap();

        let (events, _rx) = event_channel();
        let refreshed = orch
            .upload_files(
                "p1",
                &snapshot,
                vec![PendingFile::new("new.zip", vec![0u8; 16])],
                events,
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(orch.store().status_update_count().await, 0);
        // Prior record first, new record appended.
        assert_eq!(refreshed.file_deliverables.len(), 2);
        assert_eq!(refreshed.file_deliverables[0].file_name, "old.zip");
        assert_eq!(refreshed.file_deliverables[1].file_name, "new.zip");
    }

    #[tokio::test]
    async fn slot_indices_start_after_persisted_count() {
        let mut details = sample_details();
        details.file_deliverable = Some(vec![StoreFileDeliverable {
            file_name: "old.zip".to_string(),
            file_size: 5,
            download_url: "memory://p1/old.zip".to_string(),
        }]);
        let orch = orchestrator_with(details).await;
        let snapshot = orch.sync_project("p1").await.unwrap();

        let (events, mut rx) = event_channel();
        orch.upload_files(
            "p1",
            &snapshot,
            vec![
                PendingFile::new("a.zip", vec![0u8; 16]),
                PendingFile::new("b.zip", vec![0u8; 16]),
            ],
            events,
        )
        .await
        .unwrap();

        let mut slots = std::collections::BTreeSet::new();
        while let Ok(event) = rx.try_recv() {
            match event {
                SubmissionEvent::FileProgress { slot, .. }
                | SubmissionEvent::FileCompleted { slot, .. } => {
                    slots.insert(slot);
                }
            }
        }
        assert_eq!(slots.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test]
    async fn per_slot_progress_is_monotonic_and_completion_is_last() {
        let orch = orchestrator_with(sample_details()).await;
        let snapshot = orch.sync_project("p1").await.unwrap();

        let (events, mut rx) = event_channel();
        orch.upload_files(
            "p1",
            &snapshot,
            vec![PendingFile::new("a.zip", vec![0u8; 100])],
            events,
        )
        .await
        .unwrap();

        let mut last_progress = 0.0;
        let mut completed = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                SubmissionEvent::FileProgress { progress, .. } => {
                    assert!(!completed, "progress event after completion");
                    assert!(progress >= last_progress);
                    last_progress = progress;
                }
                SubmissionEvent::FileCompleted { download_url, .. } => {
                    assert!(!download_url.is_empty());
                    completed = true;
                }
            }
        }
        assert!(completed);
        assert!((last_progress - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unassigned_wallet_is_rejected_before_any_network_call() {
        let mut details = sample_details();
        details.freelancer_address = Some("0xother".to_string());
        let orch = orchestrator_with(details).await;
        let snapshot = orch.sync_project("p1").await.unwrap();

        let (events, _rx) = event_channel();
        let result = orch
            .upload_files(
                "p1",
                &snapshot,
                vec![PendingFile::new("a.zip", vec![0u8; 4])],
                events,
            )
            .await;
        assert!(matches!(result, Err(AppError::NotApproved)));

        let result = orch.upload_text("p1", &snapshot, "late notes").await;
        assert!(matches!(result, Err(AppError::NotApproved)));

        // No store update, no blob transfer happened.
        assert!(orch.store().update_log().await.is_empty());
        assert_eq!(orch.blobs().upload_count().await, 0);
    }

    #[tokio::test]
    async fn one_failed_file_rejects_the_aggregate_and_persists_nothing() {
        let store = MemoryProjectStore::new();
        store.insert("p1", &sample_details()).await;
        let blobs = MemoryBlobStore::new();
        blobs.fail_key("p1/broken.bin").await;
        let orch = SubmissionOrchestrator::new(store, blobs, WALLET);
        let snapshot = orch.sync_project("p1").await.unwrap();

        let (events, _rx) = event_channel();
        let result = orch
            .upload_files(
                "p1",
                &snapshot,
                vec![
                    PendingFile::new("ok.bin", vec![0u8; 32]),
                    PendingFile::new("broken.bin", vec![0u8; 32]),
                ],
                events,
            )
            .await;

        match result.unwrap_err() {
            AppError::Upload { file_name, reason } => {
                assert_eq!(file_name, "broken.bin");
                assert!(reason.contains("simulated transfer failure"));
            }
            other => panic!("expected Upload error, got: {:?}", other),
        }
        // The status transition ran, but no deliverable list was persisted.
        let log = orch.store().update_log().await;
        assert_eq!(log.len(), 1);
        assert!(log[0].1.status.is_some());
    }

    #[tokio::test]
    async fn empty_file_batch_is_a_no_op() {
        let orch = orchestrator_with(sample_details()).await;
        let snapshot = orch.sync_project("p1").await.unwrap();
        let (events, _rx) = event_channel();
        let result = orch
            .upload_files("p1", &snapshot, Vec::new(), events)
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(orch.store().update_log().await.is_empty());
    }

    #[tokio::test]
    async fn empty_text_is_a_no_op() {
        let orch = orchestrator_with(sample_details()).await;
        let snapshot = orch.sync_project("p1").await.unwrap();
        let result = orch.upload_text("p1", &snapshot, "").await.unwrap();
        assert!(result.is_none());
        assert!(orch.store().update_log().await.is_empty());
    }

    #[tokio::test]
    async fn text_appends_to_existing_list_without_status_update() {
        let mut details = sample_details();
        details.status = ProjectStatus::WaitingForPayment;
        details.text_deliverable = Some(vec!["hello".to_string()]);
        let orch = orchestrator_with(details).await;
        let snapshot = orch.sync_project("p1").await.unwrap();

        let refreshed = orch
            .upload_text("p1", &snapshot, "world")
            .await
            .unwrap()
            .unwrap();

        let log = orch.store().update_log().await;
        assert_eq!(log.len(), 1);
        assert_eq!(
            log[0].1.text_deliverable.as_deref(),
            Some(&["hello".to_string(), "world".to_string()][..])
        );
        assert!(log[0].1.status.is_none());
        assert_eq!(refreshed.text_deliverables, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn first_text_submission_transitions_status_once() {
        let orch = orchestrator_with(sample_details()).await;
        let snapshot = orch.sync_project("p1").await.unwrap();
        let refreshed = orch
            .upload_text("p1", &snapshot, "notes")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(orch.store().status_update_count().await, 1);
        assert_eq!(refreshed.details.status, ProjectStatus::WaitingForPayment);

        // A second submission from the refreshed snapshot does not repeat it.
        orch.upload_text("p1", &refreshed, "more notes")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(orch.store().status_update_count().await, 1);
    }

    #[tokio::test]
    async fn store_rejection_propagates_unchanged() {
        let orch = orchestrator_with(sample_details()).await;
        let snapshot = orch.sync_project("p1").await.unwrap();
        orch.store().fail_next_updates(true).await;
        let result = orch.upload_text("p1", &snapshot, "notes").await;
        assert!(matches!(result, Err(AppError::Storage(_))));
    }
}
