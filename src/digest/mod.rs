//! Canonical complaint payload and the two digests derived from it.
//!
//! The canonical string is
//! `pharmacyName-location-reason-description-contentId-timestamp`, joined with
//! [`DELIMITER`] in exactly that order. Anyone holding the off-chain record can
//! rebuild it and recompute both digests:
//!
//! - the transaction id, `keccak256(canonical)`, used as the 32-byte on-chain key;
//! - the integrity digest, `hex(sha256(canonical)) + "_" + contentId`, stored as
//!   the on-chain value.

pub mod audit;

use std::fmt;

use sha2::Sha256;
use sha3::{Digest, Keccak256};

use crate::models::{NewSubmissionRecord, SubmissionRecord, ValidatedRequest, ViolationReason};

pub const DELIMITER: char = '-';
pub const CONTENT_ID_SEPARATOR: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    #[error("content id is empty")]
    EmptyContentId,
    #[error("content id contains whitespace: {0:?}")]
    InvalidContentId(String),
    #[error("timestamp is negative: {0}")]
    NegativeTimestamp(i64),
}

/// The exact string both digests are computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalPayload {
    text: String,
    content_id: String,
}

impl CanonicalPayload {
    pub fn new(
        pharmacy_name: &str,
        location: &str,
        reason: ViolationReason,
        description: &str,
        content_id: &str,
        timestamp_ms: i64,
    ) -> Result<Self, DigestError> {
        if content_id.is_empty() {
            return Err(DigestError::EmptyContentId);
        }
        if content_id.chars().any(char::is_whitespace) {
            return Err(DigestError::InvalidContentId(content_id.to_string()));
        }
        if timestamp_ms < 0 {
            return Err(DigestError::NegativeTimestamp(timestamp_ms));
        }

        let timestamp = timestamp_ms.to_string();
        let parts: [&str; 6] = [
            pharmacy_name,
            location,
            reason.label(),
            description,
            content_id,
            &timestamp,
        ];
        Ok(Self {
            text: parts.join(&DELIMITER.to_string()),
            content_id: content_id.to_string(),
        })
    }

    pub fn for_request(
        request: &ValidatedRequest,
        content_id: &str,
        timestamp_ms: i64,
    ) -> Result<Self, DigestError> {
        Self::new(
            request.pharmacy_name(),
            request.location(),
            request.violation_reason(),
            request.description(),
            content_id,
            timestamp_ms,
        )
    }

    pub fn for_record(record: &SubmissionRecord) -> Result<Self, DigestError> {
        Self::new(
            &record.pharmacy_name,
            &record.location,
            record.reason,
            &record.description,
            &record.content_id,
            record.timestamp,
        )
    }

    pub fn for_new_record(record: &NewSubmissionRecord) -> Result<Self, DigestError> {
        Self::new(
            &record.pharmacy_name,
            &record.location,
            record.reason,
            &record.description,
            &record.content_id,
            record.timestamp,
        )
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }
}

/// 32-byte on-chain lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// 64 lowercase hex characters, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out).ok()?;
        Some(Self(out))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digests {
    pub transaction_id: TransactionId,
    pub integrity_digest: String,
}

/// Derive both digests from one payload.
pub fn derive(payload: &CanonicalPayload) -> Digests {
    Digests {
        transaction_id: transaction_id(payload),
        integrity_digest: integrity_digest(payload),
    }
}

pub fn transaction_id(payload: &CanonicalPayload) -> TransactionId {
    let hash = Keccak256::digest(payload.as_str().as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&hash);
    TransactionId(key)
}

pub fn integrity_digest(payload: &CanonicalPayload) -> String {
    let hash = Sha256::digest(payload.as_str().as_bytes());
    format!(
        "{}{CONTENT_ID_SEPARATOR}{}",
        hex::encode(hash),
        payload.content_id()
    )
}

/// Split an integrity digest into its hash and content id parts.
pub fn split_integrity_digest(value: &str) -> Option<(&str, &str)> {
    let (hash, content_id) = value.split_once(CONTENT_ID_SEPARATOR)?;
    if hash.len() != 64 || !hash.chars().all(|c| c.is_ascii_hexdigit()) || content_id.is_empty() {
        return None;
    }
    Some((hash, content_id))
}
