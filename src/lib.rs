//! Client core for a freelance-escrow marketplace.
//!
//! Covers the deliverable-submission workflow end to end: syncing project
//! state from the remote document store, staging and uploading file/text
//! deliverables with live progress, the one-time status transition on the
//! first submission, and the project-page state machine that ties it all
//! together. The document store and the blob-storage service sit behind
//! traits in `api`; HTTP implementations and in-memory fakes are provided.

pub mod api;
pub mod error;
pub mod models;
pub mod page;
pub mod services;

pub use error::{AppError, Result};
