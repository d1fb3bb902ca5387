//! Offline backend. Answers without touching the network.
//!
//! Every message classifies as `unknown` with reason `offline`, which the
//! formatter renders as a request for more detail. Useful for trying the
//! console without the classification service running.

use tracing::debug;

use crate::payload::{ChatResponse, HealthResponse};
use super::BackendError;

#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineBackend;

impl OfflineBackend {
    pub async fn classify(&self, message: &str) -> Result<ChatResponse, BackendError> {
        debug!(content_len = message.len(), "offline backend answering locally");
        Ok(ChatResponse {
            category: "unknown".to_string(),
            confidence: 0.0,
            reason: Some("offline".to_string()),
            matched_categories: Vec::new(),
            legal_frameworks: Vec::new(),
            laws: Vec::new(),
            steps: Vec::new(),
            resources: Vec::new(),
            warnings: vec![
                "The legal analysis service is offline, so this reply was not generated from your message."
                    .to_string(),
            ],
            context: None,
            case_references: Vec::new(),
        })
    }

    pub async fn health(&self) -> Result<HealthResponse, BackendError> {
        Ok(HealthResponse {
            status: "offline".to_string(),
            model_loaded: false,
            confidence_threshold: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classifies_everything_as_unknown() {
        let resp = OfflineBackend.classify("my landlord kept the deposit").await.unwrap();
        assert!(resp.is_unknown());
        assert_eq!(resp.reason.as_deref(), Some("offline"));
        assert_eq!(resp.warnings.len(), 1);
    }

    #[tokio::test]
    async fn health_reports_offline() {
        let health = OfflineBackend.health().await.unwrap();
        assert_eq!(health.status, "offline");
        assert!(!health.model_loaded);
    }
}
