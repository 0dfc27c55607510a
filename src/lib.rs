pub mod complaint;
pub mod config;
pub mod digest;
pub mod documents;
pub mod error;
pub mod http;
pub mod ledger;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod telemetry;
pub mod verification;

use std::sync::Arc;

pub use error::{PipelineFailure, StageError, ValidationError, VerificationError};
pub use pipeline::{
    EvidenceSubmissionPipeline, PipelinePolicy, PipelineRun, PipelineState, Stage,
    SubmissionReceipt,
};
pub use verification::VerificationRequester;

use crate::config::Config;
use crate::documents::RestDocumentStore;
use crate::ledger::RpcLedger;
use crate::storage::PinningGateway;

pub fn build_requester(config: &Config) -> Result<VerificationRequester, String> {
    VerificationRequester::new(config.classifier_url.clone(), config.http_timeout)
}

/// Wire the pipeline to the configured pinning gateway, ledger node and
/// document store.
pub fn build_pipeline(config: &Config) -> Result<EvidenceSubmissionPipeline, String> {
    let client = http::client(config.http_timeout)?;

    let storage = Arc::new(PinningGateway::new(
        client.clone(),
        config.pinning_url.clone(),
        config.pinning_jwt.clone(),
    ));
    // eth_sendTransaction stays open while the user answers the signature prompt.
    let ledger = Arc::new(RpcLedger::new(
        http::client(config.signing_timeout)?,
        config.rpc_url.clone(),
        config.contract_address.clone(),
        config.receipt_poll_interval,
    ));
    let documents = Arc::new(RestDocumentStore::new(
        client,
        config.documents_url.clone(),
        config.documents_token.clone(),
    ));

    tracing::info!(
        "Submission pipeline configured (contract {}, collection {})",
        config.contract_address,
        config.collection
    );

    Ok(EvidenceSubmissionPipeline::new(storage, ledger, documents)
        .with_policy(PipelinePolicy::from_config(config))
        .with_collection(config.collection.clone()))
}
