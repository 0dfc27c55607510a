use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Evidence, VerificationVerdict};

pub const PLACEHOLDER_DISTRIBUTOR: &str = "Unknown Distributor";
pub const PLACEHOLDER_LOCATION: &str = "Geolocation Tagged";

/// Violation categories offered by the complaint form. The label is the
/// wire value and the value that enters the canonical digest string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ViolationReason {
    #[default]
    #[serde(rename = "Counterfeit packaging detected")]
    CounterfeitPackaging,
    #[serde(rename = "Expired medicine sold")]
    Expired,
    #[serde(rename = "Suspicious texture/color")]
    SuspiciousAppearance,
    #[serde(rename = "Other")]
    Other,
}

impl ViolationReason {
    pub const ALL: [ViolationReason; 4] = [
        ViolationReason::CounterfeitPackaging,
        ViolationReason::Expired,
        ViolationReason::SuspiciousAppearance,
        ViolationReason::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViolationReason::CounterfeitPackaging => "Counterfeit packaging detected",
            ViolationReason::Expired => "Expired medicine sold",
            ViolationReason::SuspiciousAppearance => "Suspicious texture/color",
            ViolationReason::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.label() == label)
    }
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Required complaint fields, named as the form names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    PharmacyName,
    Location,
    Description,
    PrimaryEvidence,
}

impl DraftField {
    pub fn name(self) -> &'static str {
        match self {
            DraftField::PharmacyName => "pharmacyName",
            DraftField::Location => "location",
            DraftField::Description => "description",
            DraftField::PrimaryEvidence => "primaryEvidence",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The complaint form while the user is editing it.
#[derive(Debug, Clone, Default)]
pub struct ComplaintDraft {
    pub pharmacy_name: String,
    pub location: String,
    pub violation_reason: ViolationReason,
    pub description: String,
    pub primary_evidence: Option<Evidence>,
    pub supplementary_evidence: Vec<Evidence>,
}

impl ComplaintDraft {
    pub fn new(primary_evidence: Evidence) -> Self {
        Self {
            primary_evidence: Some(primary_evidence),
            ..Default::default()
        }
    }

    /// Draft opened from a failed scan: the scanned photo becomes the primary
    /// evidence, the distributor and location get placeholders, and the verdict
    /// supplies the description.
    pub fn for_failed_verdict(verdict: &VerificationVerdict, evidence: Evidence) -> Self {
        let mut description = format!(
            "Tablet from batch {} failed authenticity verification",
            verdict.batch_id
        );
        if let Some(confidence) = verdict.confidence {
            description.push_str(&format!(" (confidence {confidence:.2})"));
        }
        description.push('.');
        if let Some(message) = &verdict.message {
            description.push(' ');
            description.push_str(message);
        }

        Self {
            pharmacy_name: PLACEHOLDER_DISTRIBUTOR.to_string(),
            location: PLACEHOLDER_LOCATION.to_string(),
            description,
            ..Self::new(evidence)
        }
    }

    /// Prefill from a pharmacy the user picked from a list or map.
    pub fn with_pharmacy(mut self, name: impl Into<String>, address: impl Into<String>) -> Self {
        self.pharmacy_name = name.into();
        self.location = address.into();
        self
    }

    pub fn attach(&mut self, evidence: Evidence) {
        self.supplementary_evidence.push(evidence);
    }
}

/// A draft that passed validation. Only `complaint::validate` builds one.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub(crate) pharmacy_name: String,
    pub(crate) location: String,
    pub(crate) violation_reason: ViolationReason,
    pub(crate) description: String,
    pub(crate) primary_evidence: Evidence,
    pub(crate) supplementary_evidence: Vec<Evidence>,
}

impl ValidatedRequest {
    pub fn pharmacy_name(&self) -> &str {
        &self.pharmacy_name
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn violation_reason(&self) -> ViolationReason {
        self.violation_reason
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn primary_evidence(&self) -> &Evidence {
        &self.primary_evidence
    }

    pub fn supplementary_evidence(&self) -> &[Evidence] {
        &self.supplementary_evidence
    }

    pub fn attachment_count(&self) -> usize {
        self.supplementary_evidence.len()
    }
}
