//! In-memory implementations of the collaborator traits, used by tests and
//! local development. Both record every call so scenarios can assert on
//! exactly which store updates and blob transfers were issued.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tokio::sync::Mutex;

use super::{BlobStore, ProjectStore, TransferEvent, TransferSender};
use crate::error::AppError;
use crate::models::{ProjectDetails, ProjectPatch};

/// Mutex-guarded document map with a log of applied patches.
#[derive(Default)]
pub struct MemoryProjectStore {
    documents: Mutex<HashMap<String, Value>>,
    update_log: Mutex<Vec<(String, ProjectPatch)>>,
    fail_updates: Mutex<bool>,
}

impl MemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project document from its typed form.
    pub async fn insert(&self, project_id: &str, details: &ProjectDetails) {
        let raw = serde_json::to_value(details).expect("project details serialize");
        self.documents
            .lock()
            .await
            .insert(project_id.to_string(), raw);
    }

    /// Every patch applied so far, in order.
    pub async fn update_log(&self) -> Vec<(String, ProjectPatch)> {
        self.update_log.lock().await.clone()
    }

    /// Number of patches that carried a Status transition.
    pub async fn status_update_count(&self) -> usize {
        self.update_log
            .lock()
            .await
            .iter()
            .filter(|(_, patch)| patch.status.is_some())
            .count()
    }

    /// Make every subsequent update fail with a store error.
    pub async fn fail_next_updates(&self, fail: bool) {
        *self.fail_updates.lock().await = fail;
    }
}

impl ProjectStore for MemoryProjectStore {
    async fn fetch_project(
        &self,
        project_id: &str,
    ) -> crate::error::Result<(Value, ProjectDetails)> {
        let documents = self.documents.lock().await;
        let raw = documents
            .get(project_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(project_id.to_string()))?;
        let details: ProjectDetails = serde_json::from_value(raw.clone())?;
        Ok((raw, details))
    }

    async fn update_project(
        &self,
        project_id: &str,
        patch: &ProjectPatch,
    ) -> crate::error::Result<()> {
        if *self.fail_updates.lock().await {
            return Err(AppError::Storage("simulated update rejection".into()));
        }
        let mut documents = self.documents.lock().await;
        let doc = documents
            .get_mut(project_id)
            .ok_or_else(|| AppError::NotFound(project_id.to_string()))?;
        let sparse = serde_json::to_value(patch)?;
        if let (Some(doc), Some(sparse)) = (doc.as_object_mut(), sparse.as_object()) {
            for (key, value) in sparse {
                doc.insert(key.clone(), value.clone());
            }
        }
        self.update_log
            .lock()
            .await
            .push((project_id.to_string(), patch.clone()));
        Ok(())
    }
}

/// Blob store that "transfers" payloads in a fixed number of synthetic
/// chunks, emitting a progress event per chunk.
pub struct MemoryBlobStore {
    uploads: Mutex<HashMap<String, Vec<u8>>>,
    fail_keys: Mutex<HashSet<String>>,
    /// How many progress events each upload is split into.
    chunks_per_upload: u64,
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self {
            uploads: Mutex::new(HashMap::new()),
            fail_keys: Mutex::new(HashSet::new()),
            chunks_per_upload: 4,
        }
    }
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunks(chunks_per_upload: u64) -> Self {
        Self {
            chunks_per_upload: chunks_per_upload.max(1),
            ..Self::default()
        }
    }

    /// Script the next upload of this key to fail mid-transfer.
    pub async fn fail_key(&self, key: &str) {
        self.fail_keys.lock().await.insert(key.to_string());
    }

    pub async fn stored(&self, key: &str) -> Option<Vec<u8>> {
        self.uploads.lock().await.get(key).cloned()
    }

    pub async fn upload_count(&self) -> usize {
        self.uploads.lock().await.len()
    }
}

impl BlobStore for MemoryBlobStore {
    async fn upload_blob(
        &self,
        key: &str,
        payload: Vec<u8>,
        progress: TransferSender,
    ) -> crate::error::Result<String> {
        let total_bytes = payload.len() as u64;
        let chunk = (total_bytes / self.chunks_per_upload).max(1);
        let mut transferred = 0u64;

        while transferred < total_bytes {
            transferred = (transferred + chunk).min(total_bytes);
            let _ = progress.send(TransferEvent {
                bytes_transferred: transferred,
                total_bytes,
            });
            // Halfway failure for scripted keys, after some progress has
            // already been observed.
            if self.fail_keys.lock().await.contains(key) && transferred * 2 >= total_bytes {
                return Err(AppError::Network("simulated transfer failure".into()));
            }
            tokio::task::yield_now().await;
        }
        if total_bytes == 0 {
            let _ = progress.send(TransferEvent {
                bytes_transferred: 0,
                total_bytes: 0,
            });
        }

        self.uploads
            .lock()
            .await
            .insert(key.to_string(), payload);
        Ok(format!("memory://{}", key))
    }
}
