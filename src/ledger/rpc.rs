use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::abi;
use super::{ConfirmedTransaction, LedgerError, PendingTransaction, Signer, SignerProvider};
use crate::config::is_address;

/// EIP-1193 "user rejected request".
const USER_REJECTED: i64 = 4001;
/// EIP-1193 "unauthorized": no account is connected.
const UNAUTHORIZED: i64 = 4100;
/// Execution error returned by `eth_estimateGas` / `eth_sendTransaction`.
const EXECUTION_ERROR: i64 = 3;
/// Consecutive failed receipt polls before giving up on the node.
const MAX_POLL_FAILURES: u32 = 5;

#[derive(Debug, thiserror::Error)]
enum RpcFailure {
    #[error("{0}")]
    Transport(String),
    #[error("{message} (code {code})")]
    Rpc { code: i64, message: String },
}

struct Inner {
    client: reqwest::Client,
    rpc_url: String,
    contract: String,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl Inner {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcFailure> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params,
            }))
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(format!("{method} request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RpcFailure::Transport(format!("{method} returned {status}")));
        }

        let mut body: Value = resp
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(format!("{method} returned invalid JSON: {e}")))?;

        if let Some(err) = body.get("error").filter(|e| !e.is_null()) {
            return Err(RpcFailure::Rpc {
                code: err["code"].as_i64().unwrap_or(0),
                message: err["message"]
                    .as_str()
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }
}

/// Ledger access through a node's JSON-RPC interface. Signing is delegated to
/// the node (`eth_sendTransaction`), so the node or wallet bridge behind it
/// holds the credential and prompts the user.
#[derive(Clone)]
pub struct RpcLedger {
    inner: Arc<Inner>,
}

impl RpcLedger {
    pub fn new(
        client: reqwest::Client,
        rpc_url: impl Into<String>,
        contract: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                rpc_url: rpc_url.into(),
                contract: contract.into(),
                poll_interval,
                next_id: AtomicU64::new(1),
            }),
        }
    }
}

#[async_trait]
impl SignerProvider for RpcLedger {
    async fn signer(&self) -> Result<Arc<dyn Signer>, LedgerError> {
        let accounts = self
            .inner
            .call("eth_accounts", json!([]))
            .await
            .map_err(|f| match f {
                RpcFailure::Rpc {
                    code: UNAUTHORIZED,
                    message,
                } => LedgerError::NoSigner(message),
                other => LedgerError::Transport(other.to_string()),
            })?;

        let from = accounts
            .as_array()
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .filter(|s| is_address(s))
            .ok_or_else(|| LedgerError::NoSigner("no account connected".to_string()))?;

        tracing::debug!("Using signer account {from}");
        Ok(Arc::new(RpcSigner {
            inner: self.inner.clone(),
            from: from.to_string(),
        }))
    }
}

struct RpcSigner {
    inner: Arc<Inner>,
    from: String,
}

#[async_trait]
impl Signer for RpcSigner {
    fn address(&self) -> &str {
        &self.from
    }

    async fn store_evidence_hash(
        &self,
        key: [u8; 32],
        value: &str,
    ) -> Result<Box<dyn PendingTransaction>, LedgerError> {
        let data = abi::to_hex_data(&abi::encode_store_evidence_hash(&key, value));
        let tx = json!({
            "from": &self.from,
            "to": &self.inner.contract,
            "data": data,
        });

        let result = self
            .inner
            .call("eth_sendTransaction", json!([tx]))
            .await
            .map_err(send_error)?;

        let hash = result
            .as_str()
            .filter(|h| h.starts_with("0x"))
            .ok_or_else(|| {
                LedgerError::Transport("eth_sendTransaction returned no transaction hash".to_string())
            })?;

        Ok(Box::new(RpcPendingTransaction {
            inner: self.inner.clone(),
            hash: hash.to_string(),
        }))
    }
}

fn send_error(failure: RpcFailure) -> LedgerError {
    match failure {
        RpcFailure::Transport(msg) => LedgerError::Transport(msg),
        RpcFailure::Rpc {
            code: USER_REJECTED,
            message,
        } => LedgerError::Rejected(message),
        RpcFailure::Rpc {
            code: UNAUTHORIZED,
            message,
        } => LedgerError::NoSigner(message),
        RpcFailure::Rpc { code, message }
            if code == EXECUTION_ERROR || message.to_lowercase().contains("revert") =>
        {
            LedgerError::Reverted {
                tx_hash: None,
                reason: message,
            }
        }
        // Node-side failures (funds, nonce, gas price) are not a user decision.
        other => LedgerError::Transport(other.to_string()),
    }
}

struct RpcPendingTransaction {
    inner: Arc<Inner>,
    hash: String,
}

#[async_trait]
impl PendingTransaction for RpcPendingTransaction {
    fn hash(&self) -> &str {
        &self.hash
    }

    async fn wait(&self) -> Result<ConfirmedTransaction, LedgerError> {
        let mut failures = 0;

        loop {
            match self
                .inner
                .call("eth_getTransactionReceipt", json!([&self.hash]))
                .await
            {
                Ok(receipt) if receipt.is_null() || receipt["blockNumber"].is_null() => {
                    failures = 0;
                }
                Ok(receipt) => return parse_receipt(&self.hash, &receipt),
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        "Receipt poll for {} failed ({failures}/{MAX_POLL_FAILURES}): {e}",
                        self.hash
                    );
                    if failures >= MAX_POLL_FAILURES {
                        return Err(LedgerError::Transport(e.to_string()));
                    }
                }
            }

            tokio::time::sleep(self.inner.poll_interval).await;
        }
    }
}

fn parse_receipt(hash: &str, receipt: &Value) -> Result<ConfirmedTransaction, LedgerError> {
    let block_number = receipt["blockNumber"].as_str().and_then(parse_quantity);

    match receipt["status"].as_str() {
        Some("0x0") => Err(LedgerError::Reverted {
            tx_hash: Some(hash.to_string()),
            reason: "execution reverted".to_string(),
        }),
        // Pre-Byzantium receipts have no status field.
        Some("0x1") | None => Ok(ConfirmedTransaction {
            hash: hash.to_string(),
            block_number,
        }),
        Some(other) => Err(LedgerError::Transport(format!(
            "unexpected receipt status {other}"
        ))),
    }
}

fn parse_quantity(s: &str) -> Option<u64> {
    u64::from_str_radix(s.strip_prefix("0x")?, 16).ok()
}
