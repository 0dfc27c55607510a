use std::time::Duration;

use reqwest::multipart::Form;
use serde_json::Value;

use crate::error::VerificationError;
use crate::http;
use crate::models::{BatchId, Evidence, Outcome, VerificationRequest, VerificationVerdict};

/// Client for the tablet classification service. One attempt per call; the
/// caller decides whether the user may retry.
#[derive(Clone)]
pub struct VerificationRequester {
    client: reqwest::Client,
    base_url: String,
}

impl VerificationRequester {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, String> {
        Ok(Self::with_client(http::client(timeout)?, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationVerdict, VerificationError> {
        self.submit(&request.image, &request.batch_id).await
    }

    pub async fn submit(
        &self,
        image: &Evidence,
        batch_id: &BatchId,
    ) -> Result<VerificationVerdict, VerificationError> {
        let form = Form::new()
            .part("image", http::file_part(image))
            .text("batch_id", batch_id.to_string());

        tracing::debug!(
            "Submitting {} byte image for batch {batch_id} to classifier",
            image.len()
        );

        let resp = self
            .client
            .post(format!("{}/verify", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                VerificationError::ServiceUnavailable(format!("Classifier request failed: {e}"))
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(VerificationError::ServiceUnavailable(format!(
                "Classifier returned {status}"
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| VerificationError::MalformedResponse(format!("Invalid JSON: {e}")))?;

        let verdict = parse_verdict(&body, batch_id)?;
        tracing::info!(
            "Batch {} verdict {:?} (confidence {:?})",
            verdict.batch_id,
            verdict.outcome,
            verdict.confidence
        );
        Ok(verdict)
    }

    /// Probe the service's root endpoint.
    pub async fn health(&self) -> Result<(), VerificationError> {
        let resp = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(|e| VerificationError::ServiceUnavailable(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(VerificationError::ServiceUnavailable(format!(
                "Health check returned {}",
                resp.status()
            )))
        }
    }
}

/// Normalize a classifier payload.
///
/// Current replies carry `verification_result`, a `confidence` score and the
/// echoed `batch_id`. Older endpoints reply `{ "status", "message" }` with no
/// score; for those the confidence is `None`. Anything other than `PASS` is a
/// failure.
pub fn parse_verdict(
    body: &Value,
    submitted: &BatchId,
) -> Result<VerificationVerdict, VerificationError> {
    let Some(obj) = body.as_object() else {
        return Err(VerificationError::MalformedResponse(
            "Expected a JSON object".to_string(),
        ));
    };

    let (result, status_only) = match obj.get("verification_result") {
        Some(v) => (Some(v), false),
        None => (obj.get("status"), true),
    };

    let outcome = match result.and_then(|v| v.as_str()) {
        Some("PASS") => Outcome::Pass,
        Some(s) if !s.trim().is_empty() => Outcome::Fail,
        _ => {
            return Err(VerificationError::MalformedResponse(
                "Missing verification result".to_string(),
            ));
        }
    };

    let confidence = match obj
        .get("confidence")
        .or_else(|| obj.get("confidence_score"))
        .filter(|v| !v.is_null())
    {
        Some(raw) => Some(parse_confidence(raw)?),
        None if status_only => None,
        None => {
            return Err(VerificationError::MalformedResponse(
                "Missing confidence".to_string(),
            ));
        }
    };

    let batch_id = obj
        .get("batch_id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(BatchId::new)
        .unwrap_or_else(|| submitted.clone());

    let message = obj
        .get("message")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string);

    Ok(VerificationVerdict {
        outcome,
        confidence,
        batch_id,
        message,
    })
}

fn parse_confidence(raw: &Value) -> Result<f64, VerificationError> {
    let confidence = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| VerificationError::MalformedResponse(format!("Non-numeric confidence: {raw}")))?;

    if !(0.0..=1.0).contains(&confidence) {
        return Err(VerificationError::MalformedResponse(format!(
            "Confidence out of range: {confidence}"
        )));
    }
    Ok(confidence)
}
