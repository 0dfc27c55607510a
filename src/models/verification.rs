use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::Evidence;

/// Identifier of the production batch a scanned tablet claims to belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(String);

impl BatchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Random `BATCH_<n>` id for scans where the user has no batch label.
    pub fn generate() -> Self {
        let n: u32 = rand::rng().random_range(0..10_000);
        Self(format!("BATCH_{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scan attempt. Consumed by `VerificationRequester::verify`.
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub image: Evidence,
    pub batch_id: BatchId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationVerdict {
    pub outcome: Outcome,
    /// Within `[0, 1]`. Absent only in `status`-style replies, which carry a
    /// message instead of a score.
    pub confidence: Option<f64>,
    pub batch_id: BatchId,
    pub message: Option<String>,
}

impl VerificationVerdict {
    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    /// A complaint is only offered for tablets that failed verification.
    pub fn offers_complaint(&self) -> bool {
        !self.is_pass()
    }
}
