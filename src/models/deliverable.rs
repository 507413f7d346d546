//! Deliverable models: the persisted record, the in-memory display form
//! tracked while uploads are in flight, locally staged files, and the
//! merged display row handed to the view.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Persisted form of a file deliverable, exactly as stored in the project
/// document. Only fully uploaded files are ever written in this form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreFileDeliverable {
    pub file_name: String,
    pub file_size: u64,
    pub download_url: String,
}

/// In-memory form of a file deliverable. While an upload is in flight the
/// slot carries fractional progress and no URL; on completion the URL is
/// attached and progress cleared.
#[derive(Debug, Clone, PartialEq)]
pub struct FileDeliverable {
    pub file_name: String,
    pub file_size: u64,
    pub download_url: Option<String>,
    pub progress: Option<f64>,
}

impl FileDeliverable {
    /// A slot for an upload that has started but not yet reported progress.
    pub fn in_flight(file_name: String, file_size: u64) -> Self {
        Self {
            file_name,
            file_size,
            download_url: None,
            progress: Some(0.0),
        }
    }
}

impl From<StoreFileDeliverable> for FileDeliverable {
    fn from(record: StoreFileDeliverable) -> Self {
        Self {
            file_name: record.file_name,
            file_size: record.file_size,
            download_url: Some(record.download_url),
            progress: None,
        }
    }
}

/// A locally selected file that has not been uploaded yet. Transient:
/// discarded once its upload resolves or fails.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub file_name: String,
    pub payload: Vec<u8>,
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            payload,
        }
    }

    pub fn file_size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Stage a file from disk. Reads on the blocking pool to keep the
    /// event loop free.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string())
            .ok_or_else(|| AppError::Io(format!("not a file path: {}", path.display())))?;
        let payload = tokio::task::spawn_blocking(move || std::fs::read(&path))
            .await
            .map_err(|e| AppError::Internal(format!("spawn_blocking join error: {}", e)))??;
        Ok(Self { file_name, payload })
    }
}

/// Tag on a display row: persisted and retrievable, or still local-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    Uploaded,
    Waiting,
}

/// One row of the unified deliverable list shown on the submission section.
/// `download_url` is empty for waiting rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    pub name: String,
    pub size: u64,
    pub state: RowState,
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}
