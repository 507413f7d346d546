//! External collaborator abstraction layer.
//!
//! This module defines the `ProjectStore` and `BlobStore` traits, the sole
//! seams for all remote interactions. The project document store and the
//! blob-storage service live behind these traits; upper layers (`services/`,
//! `page/`) call through them and never construct requests directly, so a
//! backend swap touches only this directory. `firestore`/`firebase_storage`
//! are the HTTP implementations, `memory` the in-process fakes used by tests
//! and local development.

use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::models::{ProjectDetails, ProjectPatch};

/// One progress report from an in-flight blob transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferEvent {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

/// Channel end a `BlobStore` pushes transfer events into. Dropped by the
/// store when the transfer settles, which terminates the consumer side.
pub type TransferSender = mpsc::UnboundedSender<TransferEvent>;

/// Remote project document store.
pub trait ProjectStore: Send + Sync {
    /// Fetch a project by id, returning both the raw document and the typed
    /// view decoded from it.
    fn fetch_project(
        &self,
        project_id: &str,
    ) -> impl std::future::Future<Output = Result<(Value, ProjectDetails)>> + Send;

    /// Apply a sparse partial update; fields absent from the patch are left
    /// untouched.
    fn update_project(
        &self,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Blob-storage service accepting binary payloads.
pub trait BlobStore: Send + Sync {
    /// Upload a payload under the given key, emitting `TransferEvent`s as
    /// bytes move. Resolves to the retrieval URL of the stored object.
    fn upload_blob(
        &self,
        key: &str,
        payload: Vec<u8>,
        progress: TransferSender,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub mod firebase_storage;
pub mod firestore;
pub mod memory;
