use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{EvidenceSubmissionPipeline, PipelineState, Stage, SubmissionReceipt};
use crate::error::{PipelineFailure, StageError};
use crate::models::ValidatedRequest;

/// Handle to a spawned run. Dropping it detaches the run; it still finishes.
pub struct PipelineRun {
    id: Uuid,
    state: watch::Receiver<PipelineState>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<Result<SubmissionReceipt, PipelineFailure>>,
}

pub(super) fn spawn(pipeline: EvidenceSubmissionPipeline, request: ValidatedRequest) -> PipelineRun {
    let id = Uuid::now_v7();
    let (state_tx, state_rx) = watch::channel(PipelineState::Idle);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let task = tokio::spawn(async move { pipeline.run(id, request, cancel_rx, &state_tx).await });

    PipelineRun {
        id,
        state: state_rx,
        cancel: cancel_tx,
        task,
    }
}

impl PipelineRun {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.clone()
    }

    /// Stop at the current suspension point. Stages already committed stay
    /// committed; a broadcast transaction is left as is.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub async fn outcome(self) -> Result<SubmissionReceipt, PipelineFailure> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(PipelineFailure {
                run_id: self.id,
                stage: self.state.borrow().stage().unwrap_or(Stage::Uploading),
                error: StageError::Cancelled,
                content_id: None,
                digests: None,
                tx_hash: None,
                confirmed: None,
            }),
        }
    }
}
