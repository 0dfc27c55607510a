use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::http;

#[derive(Debug, thiserror::Error)]
pub enum DocumentStoreError {
    #[error("Document store unreachable: {0}")]
    Transport(String),
    #[error("Document store rejected write ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("Document store response malformed: {0}")]
    Malformed(String),
}

/// What the store assigned to a written document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// Durable store for flat key/value documents. The store assigns the id and
/// the creation time.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<StoredDocument, DocumentStoreError>;
}

/// REST document store: `POST {base}/collections/{collection}/documents`,
/// answered with `{ "id": .., "createdAt": .. }`.
pub struct RestDocumentStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestDocumentStore {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn insert(
        &self,
        collection: &str,
        document: Value,
    ) -> Result<StoredDocument, DocumentStoreError> {
        if !document.is_object() {
            return Err(DocumentStoreError::Malformed(
                "document must be a JSON object".to_string(),
            ));
        }

        let mut req = self
            .client
            .post(format!("{}/collections/{collection}/documents", self.base_url))
            .json(&document);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DocumentStoreError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DocumentStoreError::Rejected {
                status: status.as_u16(),
                body: http::error_body(resp).await,
            });
        }

        let stored: StoredDocument = resp
            .json()
            .await
            .map_err(|e| DocumentStoreError::Malformed(e.to_string()))?;

        tracing::debug!("Stored document {} in {collection}", stored.id);
        Ok(stored)
    }
}
