//! Data models shared across the crate: project documents and lifecycle
//! status, deliverable records in their persisted and display forms, and
//! the staged-file type the page holds before an upload starts.

pub mod deliverable;
pub mod project;

pub use deliverable::{DisplayRow, FileDeliverable, PendingFile, RowState, StoreFileDeliverable};
pub use project::{Party, ProjectDetails, ProjectPatch, ProjectSnapshot, ProjectStatus};
