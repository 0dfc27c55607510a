use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ValidatedRequest, ViolationReason};
use crate::digest::Digests;
use crate::documents::StoredDocument;

/// Review state of a complaint. Only `Pending` is ever written by this crate;
/// the remaining transitions happen server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReviewStatus {
    #[default]
    #[serde(rename = "Pending Review")]
    Pending,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Resolved")]
    Resolved,
    #[serde(rename = "Dismissed")]
    Dismissed,
}

/// The flat document written to the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmissionRecord {
    pub pharmacy_name: String,
    pub location: String,
    pub reason: ViolationReason,
    pub description: String,
    pub content_id: String,
    pub transaction_id: String,
    pub integrity_digest: String,
    pub tx_hash: String,
    /// Client wall-clock milliseconds that entered the canonical string.
    pub timestamp: i64,
    pub status: ReviewStatus,
    pub attachment_count: usize,
}

impl NewSubmissionRecord {
    pub fn new(
        request: &ValidatedRequest,
        content_id: &str,
        digests: &Digests,
        timestamp: i64,
        tx_hash: &str,
    ) -> Self {
        Self {
            pharmacy_name: request.pharmacy_name().to_string(),
            location: request.location().to_string(),
            reason: request.violation_reason(),
            description: request.description().to_string(),
            content_id: content_id.to_string(),
            transaction_id: digests.transaction_id.to_hex(),
            integrity_digest: digests.integrity_digest.clone(),
            tx_hash: tx_hash.to_string(),
            timestamp,
            status: ReviewStatus::Pending,
            attachment_count: request.attachment_count(),
        }
    }
}

/// A complaint as persisted, including what the store assigned on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: String,
    pub pharmacy_name: String,
    pub location: String,
    pub reason: ViolationReason,
    pub description: String,
    pub content_id: String,
    pub transaction_id: String,
    pub integrity_digest: String,
    pub tx_hash: String,
    pub timestamp: i64,
    pub submitted_at: DateTime<Utc>,
    pub review_status: ReviewStatus,
    pub attachment_count: usize,
}

impl SubmissionRecord {
    pub fn from_stored(record: NewSubmissionRecord, stored: StoredDocument) -> Self {
        Self {
            id: stored.id,
            pharmacy_name: record.pharmacy_name,
            location: record.location,
            reason: record.reason,
            description: record.description,
            content_id: record.content_id,
            transaction_id: record.transaction_id,
            integrity_digest: record.integrity_digest,
            tx_hash: record.tx_hash,
            timestamp: record.timestamp,
            submitted_at: stored.created_at,
            review_status: record.status,
            attachment_count: record.attachment_count,
        }
    }
}
