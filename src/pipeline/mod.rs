//! Evidence submission: upload, digest, anchor, record.
//!
//! The four stages talk to three independent systems with no shared
//! transaction. Each stage runs only after the previous one succeeded, and the
//! first failure ends the run. Nothing already committed is undone: a pinned
//! file stays pinned and a broadcast transaction is never reversed or re-sent.
//! A failure in `Recording` leaves a confirmed anchor without an off-chain
//! record; it is logged at error level with everything needed to reconcile it
//! by hand.

pub mod clock;
pub mod policy;
pub mod run;
pub mod state;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

pub use clock::{Clock, SystemClock};
pub use policy::PipelinePolicy;
pub use run::PipelineRun;
pub use state::{PipelineState, Stage};

use crate::digest::{self, CanonicalPayload, Digests};
use crate::documents::DocumentStore;
use crate::error::{PipelineFailure, StageError};
use crate::ledger::{ConfirmedTransaction, LedgerError, SignerProvider};
use crate::models::{NewSubmissionRecord, SubmissionRecord, ValidatedRequest};
use crate::storage::StorageGateway;

pub const DEFAULT_COLLECTION: &str = "complaints";

/// A completed run.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub run_id: Uuid,
    pub record: SubmissionRecord,
    pub confirmed: ConfirmedTransaction,
}

#[derive(Clone)]
pub struct EvidenceSubmissionPipeline {
    storage: Arc<dyn StorageGateway>,
    signers: Arc<dyn SignerProvider>,
    documents: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    policy: PipelinePolicy,
    collection: String,
}

impl EvidenceSubmissionPipeline {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        signers: Arc<dyn SignerProvider>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            storage,
            signers,
            documents,
            clock: Arc::new(SystemClock),
            policy: PipelinePolicy::default(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: PipelinePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn policy(&self) -> &PipelinePolicy {
        &self.policy
    }

    /// Start a run on the runtime and return a handle to observe or cancel it.
    pub fn spawn(&self, request: ValidatedRequest) -> PipelineRun {
        run::spawn(self.clone(), request)
    }

    /// Run the workflow inline. `cancel` flipping to `true` stops the run at the
    /// current suspension point; `state` receives every transition.
    pub async fn execute(
        &self,
        request: ValidatedRequest,
        cancel: watch::Receiver<bool>,
        state: &watch::Sender<PipelineState>,
    ) -> Result<SubmissionReceipt, PipelineFailure> {
        self.run(Uuid::now_v7(), request, cancel, state).await
    }

    pub(crate) async fn run(
        &self,
        run_id: Uuid,
        request: ValidatedRequest,
        mut cancel: watch::Receiver<bool>,
        state: &watch::Sender<PipelineState>,
    ) -> Result<SubmissionReceipt, PipelineFailure> {
        let span = tracing::info_span!("submission", %run_id);
        let mut attempt = Attempt::new(run_id, state);
        self.stages(&request, &mut cancel, &mut attempt)
            .instrument(span)
            .await
    }

    async fn stages(
        &self,
        request: &ValidatedRequest,
        cancel: &mut watch::Receiver<bool>,
        attempt: &mut Attempt<'_>,
    ) -> Result<SubmissionReceipt, PipelineFailure> {
        // 1. Upload
        attempt.enter(Stage::Uploading);
        let content_id = match bounded(
            cancel,
            self.policy.upload_timeout,
            self.storage.upload(request.primary_evidence()),
        )
        .await
        {
            Ok(Ok(content_id)) => content_id,
            Ok(Err(e)) => {
                return Err(attempt.fail(
                    Stage::Uploading,
                    StageError::StorageUploadFailed(e.to_string()),
                ));
            }
            Err(Interrupted::TimedOut) => {
                return Err(attempt.fail(
                    Stage::Uploading,
                    StageError::StorageUploadFailed(format!(
                        "no response within {}s",
                        self.policy.upload_timeout.as_secs()
                    )),
                ));
            }
            Err(Interrupted::Cancelled) => {
                return Err(attempt.fail(Stage::Uploading, StageError::Cancelled));
            }
        };
        tracing::info!(%content_id, "Evidence pinned");
        attempt.content_id = Some(content_id.clone());

        // 2. Digest
        if is_cancelled(cancel) {
            return Err(attempt.fail(Stage::Digesting, StageError::Cancelled));
        }
        attempt.enter(Stage::Digesting);
        let timestamp = self.clock.now_millis();
        let payload = CanonicalPayload::for_request(request, &content_id, timestamp).map_err(|e| {
            attempt.fail(Stage::Digesting, StageError::MalformedInput(e.to_string()))
        })?;
        let digests = digest::derive(&payload);
        tracing::debug!(
            transaction_id = %digests.transaction_id,
            integrity_digest = %digests.integrity_digest,
            "Digests derived"
        );
        attempt.digests = Some(digests.clone());

        // 3. Anchor
        if is_cancelled(cancel) {
            return Err(attempt.fail(Stage::Anchoring, StageError::Cancelled));
        }
        attempt.enter(Stage::Anchoring);
        let confirmed = self.anchor(&digests, cancel, attempt).await?;
        attempt.confirmed = Some(confirmed.clone());

        // 4. Record
        if is_cancelled(cancel) {
            return Err(attempt.fail(Stage::Recording, StageError::Cancelled));
        }
        attempt.enter(Stage::Recording);
        let record = NewSubmissionRecord::new(request, &content_id, &digests, timestamp, &confirmed.hash);
        let document = serde_json::to_value(&record).map_err(|e| {
            attempt.fail(Stage::Recording, StageError::PersistenceFailed(e.to_string()))
        })?;

        let stored = match bounded(
            cancel,
            self.policy.persist_timeout,
            self.documents.insert(&self.collection, document),
        )
        .await
        {
            Ok(Ok(stored)) => stored,
            Ok(Err(e)) => {
                return Err(attempt.fail(
                    Stage::Recording,
                    StageError::PersistenceFailed(e.to_string()),
                ));
            }
            Err(Interrupted::TimedOut) => {
                return Err(attempt.fail(
                    Stage::Recording,
                    StageError::PersistenceFailed(format!(
                        "no response within {}s",
                        self.policy.persist_timeout.as_secs()
                    )),
                ));
            }
            Err(Interrupted::Cancelled) => {
                return Err(attempt.fail(Stage::Recording, StageError::Cancelled));
            }
        };

        let record = SubmissionRecord::from_stored(record, stored);
        attempt.complete(&record);

        Ok(SubmissionReceipt {
            run_id: attempt.run_id,
            record,
            confirmed,
        })
    }

    /// Stage 3. The signer is acquired here and released on return.
    async fn anchor(
        &self,
        digests: &Digests,
        cancel: &mut watch::Receiver<bool>,
        attempt: &mut Attempt<'_>,
    ) -> Result<ConfirmedTransaction, PipelineFailure> {
        let stage = Stage::Anchoring;
        let signing_timeout = self.policy.signing_timeout;
        let confirmation_timeout = self.policy.confirmation_timeout;

        let signer = match bounded(cancel, signing_timeout, self.signers.signer()).await {
            Ok(Ok(signer)) => signer,
            Ok(Err(e)) => return Err(attempt.fail(stage, ledger_error(e, None))),
            Err(Interrupted::TimedOut) => {
                return Err(attempt.fail(
                    stage,
                    StageError::NoSigningCapability(format!(
                        "no signer available within {}s",
                        signing_timeout.as_secs()
                    )),
                ));
            }
            Err(Interrupted::Cancelled) => return Err(attempt.fail(stage, StageError::Cancelled)),
        };
        tracing::debug!(signer = signer.address(), "Signer acquired");

        let pending = match bounded(
            cancel,
            signing_timeout,
            signer.store_evidence_hash(
                *digests.transaction_id.as_bytes(),
                &digests.integrity_digest,
            ),
        )
        .await
        {
            Ok(Ok(pending)) => pending,
            Ok(Err(e)) => return Err(attempt.fail(stage, ledger_error(e, None))),
            Err(Interrupted::TimedOut) => {
                return Err(attempt.fail(
                    stage,
                    StageError::SigningRejected(format!(
                        "signer did not respond within {}s",
                        signing_timeout.as_secs()
                    )),
                ));
            }
            Err(Interrupted::Cancelled) => return Err(attempt.fail(stage, StageError::Cancelled)),
        };

        let tx_hash = pending.hash().to_string();
        tracing::info!(%tx_hash, "Anchor transaction broadcast");
        attempt.tx_hash = Some(tx_hash.clone());

        match bounded(cancel, confirmation_timeout, pending.wait()).await {
            Ok(Ok(confirmed)) => {
                tracing::info!(
                    tx_hash = %confirmed.hash,
                    block = ?confirmed.block_number,
                    "Anchor confirmed"
                );
                Ok(confirmed)
            }
            Ok(Err(e)) => Err(attempt.fail(stage, ledger_error(e, Some(&tx_hash)))),
            Err(Interrupted::TimedOut) => Err(attempt.fail(
                stage,
                StageError::ConfirmationTimeout {
                    tx_hash,
                    waited: confirmation_timeout,
                },
            )),
            Err(Interrupted::Cancelled) => Err(attempt.fail(stage, StageError::Cancelled)),
        }
    }
}

fn ledger_error(err: LedgerError, known_hash: Option<&str>) -> StageError {
    match err {
        LedgerError::NoSigner(msg) => StageError::NoSigningCapability(msg),
        LedgerError::Rejected(msg) => StageError::SigningRejected(msg),
        LedgerError::Reverted { tx_hash, reason } => StageError::TransactionReverted {
            tx_hash: tx_hash.or_else(|| known_hash.map(str::to_string)),
            reason,
        },
        LedgerError::Transport(msg) => StageError::LedgerUnavailable(msg),
    }
}

/// Commitments made so far by one run, and its state channel.
struct Attempt<'a> {
    run_id: Uuid,
    state: &'a watch::Sender<PipelineState>,
    content_id: Option<String>,
    digests: Option<Digests>,
    tx_hash: Option<String>,
    confirmed: Option<ConfirmedTransaction>,
}

impl<'a> Attempt<'a> {
    fn new(run_id: Uuid, state: &'a watch::Sender<PipelineState>) -> Self {
        state.send_replace(PipelineState::Idle);
        Self {
            run_id,
            state,
            content_id: None,
            digests: None,
            tx_hash: None,
            confirmed: None,
        }
    }

    fn enter(&self, stage: Stage) {
        tracing::info!(%stage, "Entering stage");
        self.state.send_replace(PipelineState::entering(stage));
    }

    fn complete(&self, record: &SubmissionRecord) {
        tracing::info!(
            record_id = %record.id,
            tx_hash = %record.tx_hash,
            "Complaint submitted"
        );
        self.state.send_replace(PipelineState::Completed);
    }

    fn fail(&self, stage: Stage, error: StageError) -> PipelineFailure {
        if let Some(confirmed) = &self.confirmed {
            tracing::error!(
                run_id = %self.run_id,
                tx_hash = %confirmed.hash,
                transaction_id = ?self.digests.as_ref().map(|d| d.transaction_id.to_hex()),
                integrity_digest = ?self.digests.as_ref().map(|d| d.integrity_digest.as_str()),
                content_id = ?self.content_id.as_deref(),
                "Anchor confirmed on-chain without an off-chain record; needs manual reconciliation: {error}"
            );
        } else if let Some(tx_hash) = &self.tx_hash {
            tracing::warn!(%stage, %tx_hash, "Run stopped after broadcast: {error}");
        } else {
            tracing::warn!(%stage, "Run failed: {error}");
        }

        self.state.send_replace(PipelineState::Failed {
            stage,
            reason: error.clone(),
        });

        PipelineFailure {
            run_id: self.run_id,
            stage,
            error,
            content_id: self.content_id.clone(),
            digests: self.digests.clone(),
            tx_hash: self.tx_hash.clone(),
            confirmed: self.confirmed.clone(),
        }
    }
}

enum Interrupted {
    Cancelled,
    TimedOut,
}

/// Await `fut` for at most `limit`, giving up early if the run is cancelled.
/// Giving up only drops the future; nothing is sent to undo it.
async fn bounded<F: Future>(
    cancel: &mut watch::Receiver<bool>,
    limit: Duration,
    fut: F,
) -> Result<F::Output, Interrupted> {
    if is_cancelled(cancel) {
        return Err(Interrupted::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancelled(cancel) => Err(Interrupted::Cancelled),
        res = tokio::time::timeout(limit, fut) => res.map_err(|_| Interrupted::TimedOut),
    }
}

fn is_cancelled(cancel: &watch::Receiver<bool>) -> bool {
    *cancel.borrow()
}

async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        // Sender gone: nobody can cancel any more.
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
