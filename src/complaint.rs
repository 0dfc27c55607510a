use std::collections::BTreeSet;

use crate::error::ValidationError;
use crate::models::{ComplaintDraft, DraftField, ValidatedRequest};

/// Check that every required field is non-empty and freeze the draft. Text is
/// kept exactly as typed, since it enters the canonical digest string.
/// Supplementary evidence is optional.
pub fn validate(draft: &ComplaintDraft) -> Result<ValidatedRequest, ValidationError> {
    let missing = missing_fields(draft);
    if !missing.is_empty() {
        tracing::debug!("Complaint draft incomplete: {:?}", missing);
        return Err(ValidationError {
            missing_fields: missing,
        });
    }

    let Some(primary_evidence) = draft.primary_evidence.clone() else {
        return Err(ValidationError {
            missing_fields: BTreeSet::from([DraftField::PrimaryEvidence]),
        });
    };

    Ok(ValidatedRequest {
        pharmacy_name: draft.pharmacy_name.clone(),
        location: draft.location.clone(),
        violation_reason: draft.violation_reason,
        description: draft.description.clone(),
        primary_evidence,
        supplementary_evidence: draft.supplementary_evidence.clone(),
    })
}

/// Required fields that are still empty.
pub fn missing_fields(draft: &ComplaintDraft) -> BTreeSet<DraftField> {
    let mut missing = BTreeSet::new();

    if draft.pharmacy_name.is_empty() {
        missing.insert(DraftField::PharmacyName);
    }
    if draft.location.is_empty() {
        missing.insert(DraftField::Location);
    }
    if draft.description.is_empty() {
        missing.insert(DraftField::Description);
    }
    match &draft.primary_evidence {
        Some(evidence) if !evidence.is_empty() => {}
        _ => {
            missing.insert(DraftField::PrimaryEvidence);
        }
    }

    missing
}
