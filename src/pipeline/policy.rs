use std::time::Duration;

use crate::config::Config;

/// Upper bounds on each suspension point of a run.
///
/// The confirmation ceiling defaults to 120 s, about 60 blocks at a 2 s block
/// time. A transaction that is still pending after that is reported as
/// `ConfirmationTimeout` with its hash; the run never re-sends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelinePolicy {
    pub upload_timeout: Duration,
    /// Covers acquiring the signer and the user answering the signature prompt.
    pub signing_timeout: Duration,
    pub confirmation_timeout: Duration,
    pub persist_timeout: Duration,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            upload_timeout: Duration::from_secs(30),
            signing_timeout: Duration::from_secs(300),
            confirmation_timeout: Duration::from_secs(120),
            persist_timeout: Duration::from_secs(30),
        }
    }
}

impl PipelinePolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            upload_timeout: config.http_timeout,
            signing_timeout: config.signing_timeout,
            confirmation_timeout: config.confirmation_timeout,
            persist_timeout: config.http_timeout,
        }
    }
}
