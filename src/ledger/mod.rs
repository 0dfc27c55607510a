//! Ledger capabilities used for anchoring.
//!
//! A [`SignerProvider`] yields a [`Signer`] only while a signing credential is
//! available. The signer exposes the contract's single store operation, which
//! returns a [`PendingTransaction`] that can be awaited until confirmed.

pub mod abi;
pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use rpc::RpcLedger;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LedgerError {
    #[error("No signer available: {0}")]
    NoSigner(String),
    #[error("Signature request rejected: {0}")]
    Rejected(String),
    #[error("Transaction reverted: {reason}")]
    Reverted {
        tx_hash: Option<String>,
        reason: String,
    },
    #[error("Ledger node error: {0}")]
    Transport(String),
}

/// A transaction the ledger has included successfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedTransaction {
    pub hash: String,
    pub block_number: Option<u64>,
}

#[async_trait]
pub trait SignerProvider: Send + Sync {
    /// Acquire the signer. Fails with [`LedgerError::NoSigner`] when no wallet
    /// or account is connected.
    async fn signer(&self) -> Result<Arc<dyn Signer>, LedgerError>;
}

#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> &str;

    /// Sign and broadcast `storeEvidenceHash(key, value)`.
    async fn store_evidence_hash(
        &self,
        key: [u8; 32],
        value: &str,
    ) -> Result<Box<dyn PendingTransaction>, LedgerError>;
}

#[async_trait]
pub trait PendingTransaction: Send + Sync {
    fn hash(&self) -> &str;

    /// Resolve once the transaction is confirmed. Unbounded; callers cap it.
    async fn wait(&self) -> Result<ConfirmedTransaction, LedgerError>;
}
