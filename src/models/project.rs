//! Project record model: lifecycle status, store document shape, and the
//! sparse patch used for partial updates.
//!
//! Field names mirror the remote store documents exactly, so these types
//! (de)serialize straight against what the store holds.

use serde::{Deserialize, Serialize};

use crate::models::deliverable::{FileDeliverable, StoreFileDeliverable};

/// Project lifecycle status as stored in the project document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    // The store documents spell this with a right single quote (U+2019).
    #[serde(rename = "Waiting for connecting lancer\u{2019}s wallet")]
    WaitingForConnectingLancersWallet,
    #[serde(rename = "Waiting for Submission")]
    WaitingForSubmission,
    #[serde(rename = "Pay in Advance")]
    PayInAdvance,
    #[serde(rename = "Waiting for Payment")]
    WaitingForPayment,
    #[serde(rename = "In Dispute")]
    InDispute,
    #[serde(rename = "Cancel")]
    Cancel,
    #[serde(rename = "Complete (Approval)")]
    CompleteApproval,
    #[serde(rename = "Complete (Disapproval)")]
    CompleteDisapproval,
    #[serde(rename = "Complete (Dispute)")]
    CompleteDispute,
    #[serde(rename = "Complete (No Submission by Lancer)")]
    CompleteNoSubmissionByLancer,
    #[serde(rename = "Complete (No Contact by Client)")]
    CompleteNoContactByClient,
}

/// Which side of the escrow has to act next for a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Client,
    Freelancer,
    Neither,
}

impl ProjectStatus {
    /// Statuses after which nothing further happens on the project.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProjectStatus::Cancel
                | ProjectStatus::CompleteApproval
                | ProjectStatus::CompleteDisapproval
                | ProjectStatus::CompleteDispute
                | ProjectStatus::CompleteNoSubmissionByLancer
                | ProjectStatus::CompleteNoContactByClient
        )
    }

    /// Whether the submission section is available. The excluded set is
    /// fixed: every terminal status, disputes, and the pre-payment stage.
    pub fn accepts_submissions(self) -> bool {
        !(self.is_terminal()
            || matches!(self, ProjectStatus::InDispute | ProjectStatus::PayInAdvance))
    }

    /// Which party the project is currently waiting on.
    pub fn awaiting(self) -> Party {
        match self {
            ProjectStatus::WaitingForConnectingLancersWallet
            | ProjectStatus::WaitingForSubmission => Party::Freelancer,
            ProjectStatus::PayInAdvance | ProjectStatus::WaitingForPayment => Party::Client,
            _ => Party::Neither,
        }
    }
}

/// Typed view of a project document. Optional deliverable fields are absent
/// until the first submission lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetails {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Detail")]
    pub detail: String,
    #[serde(rename = "Deadline(UTC)")]
    pub deadline: String,
    #[serde(rename = "Reward(USDC)")]
    pub reward: f64,
    #[serde(rename = "Client's Wallet Address")]
    pub client_address: String,
    #[serde(
        rename = "Freelancer's Wallet Address",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub freelancer_address: Option<String>,
    #[serde(rename = "Status")]
    pub status: ProjectStatus,
    #[serde(
        rename = "fileDeliverable",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_deliverable: Option<Vec<StoreFileDeliverable>>,
    #[serde(
        rename = "textDeliverable",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub text_deliverable: Option<Vec<String>>,
}

impl ProjectDetails {
    /// Explicit first-submission guard: true once any file or text
    /// deliverable has ever been persisted for this project.
    pub fn has_any_deliverable(&self) -> bool {
        self.file_deliverable.is_some() || self.text_deliverable.is_some()
    }
}

/// Sparse partial update for a project document. `None` fields are omitted
/// from serialization and left untouched by the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectPatch {
    #[serde(rename = "Status", skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(rename = "fileDeliverable", skip_serializing_if = "Option::is_none")]
    pub file_deliverable: Option<Vec<StoreFileDeliverable>>,
    #[serde(rename = "textDeliverable", skip_serializing_if = "Option::is_none")]
    pub text_deliverable: Option<Vec<String>>,
}

impl ProjectPatch {
    pub fn status(status: ProjectStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn file_deliverables(records: Vec<StoreFileDeliverable>) -> Self {
        Self {
            file_deliverable: Some(records),
            ..Self::default()
        }
    }

    pub fn text_deliverables(texts: Vec<String>) -> Self {
        Self {
            text_deliverable: Some(texts),
            ..Self::default()
        }
    }
}

/// The resynced local view of one project, handed between the presentation
/// layer and the orchestrator. Snapshots go in, fresh snapshots come out;
/// the orchestrator never mutates caller state.
#[derive(Debug, Clone)]
pub struct ProjectSnapshot {
    pub details: ProjectDetails,
    /// Whether the connected wallet is approved to submit deliverables.
    pub is_assigned: bool,
    pub file_deliverables: Vec<FileDeliverable>,
    pub text_deliverables: Vec<String>,
}
