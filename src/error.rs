use std::collections::BTreeSet;
use std::time::Duration;

use uuid::Uuid;

use crate::digest::Digests;
use crate::ledger::ConfirmedTransaction;
use crate::models::DraftField;
use crate::pipeline::Stage;

/// Failures of a single classification request. The user may scan again.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VerificationError {
    #[error("Verification service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Malformed verification response: {0}")]
    MalformedResponse(String),
}

/// The draft is missing required fields. Fixed by the user, nothing was sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Missing required fields: {}", join_fields(.missing_fields))]
pub struct ValidationError {
    pub missing_fields: BTreeSet<DraftField>,
}

impl ValidationError {
    pub fn is_missing(&self, field: DraftField) -> bool {
        self.missing_fields.contains(&field)
    }
}

fn join_fields(fields: &BTreeSet<DraftField>) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a pipeline stage failed. Every kind is recovered from by starting a new
/// run from a fresh draft.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    #[error("Evidence upload failed: {0}")]
    StorageUploadFailed(String),
    #[error("Malformed digest input: {0}")]
    MalformedInput(String),
    #[error("No signing capability: {0}")]
    NoSigningCapability(String),
    #[error("Signing rejected: {0}")]
    SigningRejected(String),
    #[error("Transaction reverted: {reason}")]
    TransactionReverted {
        tx_hash: Option<String>,
        reason: String,
    },
    #[error("Transaction {tx_hash} not confirmed within {}s", .waited.as_secs())]
    ConfirmationTimeout { tx_hash: String, waited: Duration },
    #[error("Ledger node unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("Persisting the complaint record failed: {0}")]
    PersistenceFailed(String),
    #[error("Cancelled")]
    Cancelled,
}

/// A run that stopped before `Completed`, with every external commitment it
/// had already made.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} stage failed: {error}")]
pub struct PipelineFailure {
    pub run_id: Uuid,
    pub stage: Stage,
    pub error: StageError,
    /// Set once the evidence is pinned.
    pub content_id: Option<String>,
    /// Set once the digests were derived.
    pub digests: Option<Digests>,
    /// Set once the anchoring transaction was handed to the ledger.
    pub tx_hash: Option<String>,
    /// Set once the anchoring transaction confirmed.
    pub confirmed: Option<ConfirmedTransaction>,
}

impl PipelineFailure {
    /// The anchor is on-chain but no off-chain record exists for it.
    /// Needs manual reconciliation.
    pub fn is_orphaned_anchor(&self) -> bool {
        self.confirmed.is_some()
    }

    /// A transaction may have been broadcast; a retry needs a fresh draft so it
    /// derives a new key.
    pub fn has_broadcast(&self) -> bool {
        self.tx_hash.is_some()
    }
}
