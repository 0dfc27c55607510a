use super::{CanonicalPayload, DigestError, Digests, derive, split_integrity_digest};
use crate::models::SubmissionRecord;

/// Result of recomputing a stored complaint's digests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub expected: Digests,
    /// The stored transaction id equals the recomputed key.
    pub transaction_id_matches: bool,
    /// The value read from the ledger equals the recomputed integrity digest.
    pub anchor_matches: bool,
    /// The content id bound into the ledger value is the record's content id.
    pub content_id_matches: bool,
}

impl AuditReport {
    pub fn is_intact(&self) -> bool {
        self.transaction_id_matches && self.anchor_matches && self.content_id_matches
    }
}

/// Recompute both digests from an off-chain record and compare them with the
/// value stored on-chain under the record's transaction id.
pub fn verify_record(
    record: &SubmissionRecord,
    anchored_value: &str,
) -> Result<AuditReport, DigestError> {
    let payload = CanonicalPayload::for_record(record)?;
    let expected = derive(&payload);

    let transaction_id_matches = expected.transaction_id.to_hex()
        == record.transaction_id.trim_start_matches("0x").to_ascii_lowercase();
    let anchor_matches = expected.integrity_digest == anchored_value;
    let content_id_matches = split_integrity_digest(anchored_value)
        .is_some_and(|(_, content_id)| content_id == record.content_id);

    if !anchor_matches {
        tracing::warn!(
            record_id = %record.id,
            transaction_id = %record.transaction_id,
            "anchored value does not match recomputed integrity digest"
        );
    }

    Ok(AuditReport {
        expected,
        transaction_id_matches,
        anchor_matches,
        content_id_matches,
    })
}
