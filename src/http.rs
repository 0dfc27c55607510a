use std::time::Duration;

use reqwest::multipart::Part;

use crate::models::Evidence;

/// Shared client for the HTTP adapters.
pub fn client(timeout: Duration) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {e}"))
}

/// Multipart file part for a piece of evidence. An unparsable content type
/// falls back to the client's default.
pub fn file_part(evidence: &Evidence) -> Part {
    let part = || Part::bytes(evidence.bytes.to_vec()).file_name(evidence.file_name.clone());
    part().mime_str(&evidence.content_type).unwrap_or_else(|_| part())
}

/// Read at most 1024 characters of an error body.
pub async fn error_body(resp: reqwest::Response) -> String {
    resp.text()
        .await
        .unwrap_or_default()
        .chars()
        .take(1024)
        .collect()
}
