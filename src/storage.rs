use async_trait::async_trait;
use reqwest::multipart::Form;
use serde::Deserialize;

use crate::http;
use crate::models::Evidence;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage gateway unreachable: {0}")]
    Transport(String),
    #[error("Storage gateway rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Storage gateway response malformed: {0}")]
    Malformed(String),
}

/// Content-addressed storage: pins a file and returns its content id.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn upload(&self, file: &Evidence) -> Result<String, StorageError>;
}

/// Pinning-service gateway (`POST /pinning/pinFileToIPFS`).
pub struct PinningGateway {
    client: reqwest::Client,
    base_url: String,
    jwt: String,
}

impl PinningGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            jwt: jwt.into(),
        }
    }
}

#[derive(Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

#[async_trait]
impl StorageGateway for PinningGateway {
    async fn upload(&self, file: &Evidence) -> Result<String, StorageError> {
        let form = Form::new().part("file", http::file_part(file));

        let resp = self
            .client
            .post(format!("{}/pinning/pinFileToIPFS", self.base_url))
            .bearer_auth(&self.jwt)
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body: http::error_body(resp).await,
            });
        }

        let pinned: PinResponse = resp
            .json()
            .await
            .map_err(|e| StorageError::Malformed(e.to_string()))?;

        if pinned.ipfs_hash.trim().is_empty() {
            return Err(StorageError::Malformed("empty content id".to_string()));
        }

        tracing::debug!("Pinned {} ({} bytes) as {}", file.file_name, file.len(), pinned.ipfs_hash);
        Ok(pinned.ipfs_hash)
    }
}
