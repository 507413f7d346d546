//! Core services: the deliverable state reconciler, upload progress
//! bookkeeping, and the submission orchestrator.

pub mod progress;
pub mod reconciler;
pub mod submission;
