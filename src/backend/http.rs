//! HTTP transport for the classification service.
//!
//! `POST {base}/chat` with `{ "message": ... }` answers a [`ChatResponse`];
//! `GET {base}/health` answers a [`HealthResponse`]. Error bodies may be a
//! `{ "detail": ... }` envelope or arbitrary text.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, trace};

use crate::payload::{ChatRequest, ChatResponse, HealthResponse};
use super::BackendError;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    /// `timeout_seconds = None` leaves requests unbounded.
    pub fn new(base_url: String, timeout_seconds: Option<u64>) -> Result<Self, BackendError> {
        let mut builder = Client::builder();
        if let Some(secs) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| BackendError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn classify(&self, message: &str) -> Result<ChatResponse, BackendError> {
        let url = format!("{}/chat", self.base_url);
        let payload = ChatRequest { message: message.to_string() };

        debug!(%url, content_len = message.len(), "sending classification request");

        let response = self.client.post(&url).json(&payload).send().await.map_err(|e| {
            error!(%url, error = %e, "classification request failed (transport)");
            BackendError::Request(e.to_string())
        })?;
        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Request(format!("failed to read response body: {e}")))?;
        trace!(%body, "raw classification response");

        let parsed: ChatResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "failed to deserialize classification response");
            BackendError::Decode(e.to_string())
        })?;

        debug!(
            category = %parsed.category,
            confidence = parsed.confidence,
            laws = parsed.laws.len(),
            "received classification"
        );
        Ok(parsed)
    }

    pub async fn health(&self) -> Result<HealthResponse, BackendError> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Request(format!("unreachable: {e}")))?;
        let response = check_status(response).await?;
        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    detail: serde_json::Value,
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let body = match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(ErrorEnvelope { detail: serde_json::Value::String(s) }) => s,
        Ok(ErrorEnvelope { detail }) => detail.to_string(),
        Err(_) => body,
    };

    error!(%status, %body, "classification service returned HTTP error");
    Err(BackendError::Status { status: status.as_u16(), body })
}
