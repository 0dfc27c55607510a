#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::Notify;

use mediblock::documents::{DocumentStore, DocumentStoreError, StoredDocument};
use mediblock::ledger::{
    ConfirmedTransaction, LedgerError, PendingTransaction, Signer, SignerProvider,
};
use mediblock::models::{ComplaintDraft, Evidence, ViolationReason};
use mediblock::pipeline::Clock;
use mediblock::storage::{StorageError, StorageGateway};
use mediblock::EvidenceSubmissionPipeline;

pub const TIMESTAMP_MS: i64 = 1_717_171_717_171;
pub const SIGNER_ADDRESS: &str = "0x1111111111111111111111111111111111111111";

// ── Fixtures ────────────────────────────────────────────────────

pub fn evidence() -> Evidence {
    Evidence::jpeg("tablet.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3, 4])
}

/// A draft with every required field filled.
pub fn complete_draft() -> ComplaintDraft {
    ComplaintDraft {
        pharmacy_name: "City Meds Store".to_string(),
        location: "123 Main St, New York".to_string(),
        violation_reason: ViolationReason::CounterfeitPackaging,
        description: "Blister pack print is blurred and the seal is broken".to_string(),
        primary_evidence: Some(evidence()),
        supplementary_evidence: vec![Evidence::jpeg("box.jpg", vec![9, 9, 9])],
    }
}

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 31, 16, 8, 37).unwrap()
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

pub fn pipeline(
    storage: &Arc<MockStorage>,
    ledger: &Arc<MockLedger>,
    documents: &Arc<MockDocuments>,
) -> EvidenceSubmissionPipeline {
    EvidenceSubmissionPipeline::new(storage.clone(), ledger.clone(), documents.clone())
        .with_clock(Arc::new(FixedClock(TIMESTAMP_MS)))
}

// ── Storage gateway ─────────────────────────────────────────────

pub enum Upload {
    Pinned(&'static str),
    NetworkError,
    Hang,
}

pub struct MockStorage {
    reply: Upload,
    pub uploads: AtomicUsize,
}

impl MockStorage {
    pub fn new(reply: Upload) -> Arc<Self> {
        Arc::new(Self {
            reply,
            uploads: AtomicUsize::new(0),
        })
    }

    pub fn uploads(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageGateway for MockStorage {
    async fn upload(&self, _file: &Evidence) -> Result<String, StorageError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Upload::Pinned(cid) => Ok(cid.to_string()),
            Upload::NetworkError => Err(StorageError::Transport("connection reset by peer".to_string())),
            Upload::Hang => std::future::pending().await,
        }
    }
}

// ── Ledger ──────────────────────────────────────────────────────

pub enum Sending {
    Broadcast(&'static str),
    Reject,
    Revert,
    NodeError,
}

pub enum Confirm {
    Confirmed,
    Revert,
    Hang,
}

pub struct LedgerState {
    connected: bool,
    send: Sending,
    confirm: Confirm,
    pub signer_requests: AtomicUsize,
    pub store_calls: Mutex<Vec<([u8; 32], String)>>,
    /// Notified when a pending transaction starts waiting for confirmation.
    pub waiting: Notify,
}

pub struct MockLedger {
    pub state: Arc<LedgerState>,
}

impl MockLedger {
    pub fn new(connected: bool, send: Sending, confirm: Confirm) -> Arc<Self> {
        Arc::new(Self {
            state: Arc::new(LedgerState {
                connected,
                send,
                confirm,
                signer_requests: AtomicUsize::new(0),
                store_calls: Mutex::new(Vec::new()),
                waiting: Notify::new(),
            }),
        })
    }

    pub fn confirming(hash: &'static str) -> Arc<Self> {
        Self::new(true, Sending::Broadcast(hash), Confirm::Confirmed)
    }

    pub fn signer_requests(&self) -> usize {
        self.state.signer_requests.load(Ordering::SeqCst)
    }

    pub fn store_calls(&self) -> Vec<([u8; 32], String)> {
        self.state.store_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SignerProvider for MockLedger {
    async fn signer(&self) -> Result<Arc<dyn Signer>, LedgerError> {
        self.state.signer_requests.fetch_add(1, Ordering::SeqCst);
        if !self.state.connected {
            return Err(LedgerError::NoSigner("wallet not connected".to_string()));
        }
        Ok(Arc::new(MockSigner {
            state: self.state.clone(),
        }))
    }
}

struct MockSigner {
    state: Arc<LedgerState>,
}

#[async_trait]
impl Signer for MockSigner {
    fn address(&self) -> &str {
        SIGNER_ADDRESS
    }

    async fn store_evidence_hash(
        &self,
        key: [u8; 32],
        value: &str,
    ) -> Result<Box<dyn PendingTransaction>, LedgerError> {
        self.state
            .store_calls
            .lock()
            .unwrap()
            .push((key, value.to_string()));

        match self.state.send {
            Sending::Broadcast(hash) => Ok(Box::new(MockPending {
                state: self.state.clone(),
                hash: hash.to_string(),
            })),
            Sending::Reject => Err(LedgerError::Rejected("User denied transaction signature".to_string())),
            Sending::Revert => Err(LedgerError::Reverted {
                tx_hash: None,
                reason: "execution reverted: duplicate key".to_string(),
            }),
            Sending::NodeError => Err(LedgerError::Transport(
                "insufficient funds for gas * price + value (code -32000)".to_string(),
            )),
        }
    }
}

struct MockPending {
    state: Arc<LedgerState>,
    hash: String,
}

#[async_trait]
impl PendingTransaction for MockPending {
    fn hash(&self) -> &str {
        &self.hash
    }

    async fn wait(&self) -> Result<ConfirmedTransaction, LedgerError> {
        self.state.waiting.notify_one();
        match self.state.confirm {
            Confirm::Confirmed => Ok(ConfirmedTransaction {
                hash: self.hash.clone(),
                block_number: Some(42),
            }),
            Confirm::Revert => Err(LedgerError::Reverted {
                tx_hash: None,
                reason: "execution reverted".to_string(),
            }),
            Confirm::Hang => std::future::pending().await,
        }
    }
}

// ── Document store ──────────────────────────────────────────────

pub enum Store {
    Accept,
    Fail,
    Hang,
}

pub struct MockDocuments {
    reply: Store,
    pub writes: Mutex<Vec<(String, Value)>>,
    /// Notified when an insert starts.
    pub inserting: Notify,
}

impl MockDocuments {
    pub fn new(reply: Store) -> Arc<Self> {
        Arc::new(Self {
            reply,
            writes: Mutex::new(Vec::new()),
            inserting: Notify::new(),
        })
    }

    pub fn accepting() -> Arc<Self> {
        Self::new(Store::Accept)
    }

    pub fn failing() -> Arc<Self> {
        Self::new(Store::Fail)
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentStore for MockDocuments {
    async fn insert(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<StoredDocument, DocumentStoreError> {
        self.inserting.notify_one();
        match self.reply {
            Store::Accept => {}
            Store::Fail => {
                return Err(DocumentStoreError::Transport("deadline exceeded".to_string()));
            }
            Store::Hang => std::future::pending().await,
        }
        self.writes
            .lock()
            .unwrap()
            .push((collection.to_string(), document));
        Ok(StoredDocument {
            id: "doc-1".to_string(),
            created_at: created_at(),
        })
    }
}

// ── HTTP fakes ──────────────────────────────────────────────────

/// Serve `app` on a random local port, return its base URL.
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr: SocketAddr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    format!("http://{addr}")
}

/// A base URL nothing listens on.
pub async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .unwrap()
}
