//! Application error type shared across all layers.
//!
//! Orchestration code never swallows errors; everything propagates to the
//! presentation layer, which classifies by variant (approval failure vs
//! everything else) when building user-facing notifications.

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The connected wallet has not been approved to submit deliverables
    /// for this project. Raised before any network effect.
    #[error("not approved for the project")]
    NotApproved,

    /// A single file transfer failed. Carries the file identity and the
    /// underlying cause so the aggregate rejection stays diagnosable.
    #[error("upload failed for '{file_name}': {reason}")]
    Upload { file_name: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    /// The remote project store rejected a fetch or partial update.
    #[error("store error: {0}")]
    Storage(String),

    #[error("project not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
