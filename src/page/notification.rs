//! Notification values surfaced by the project page. Rendering is someone
//! else's job; the page only decides which notification to raise.

use serde::Serialize;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn submission_success() -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Successfully submitted the deliverables".to_string(),
            message: "Well done! Wait till your submissions get approved by the client."
                .to_string(),
        }
    }

    pub fn not_approved() -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Not Approved".to_string(),
            message: "Address not approved for the project".to_string(),
        }
    }

    pub fn submission_failed() -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            message: "Error submitting the deliverables".to_string(),
        }
    }

    pub fn link_copied() -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Copy the link".to_string(),
            message: "Successfully copied the link to the clipboard".to_string(),
        }
    }
}

/// Map a submission failure to its user-facing notification: the approval
/// failure keeps its own variant, everything else collapses to a generic
/// failure.
pub fn classify(err: &AppError) -> Notification {
    match err {
        AppError::NotApproved => Notification::not_approved(),
        _ => Notification::submission_failed(),
    }
}
