//! Classification service client.
//!
//! `Backend` is an enum over concrete transports. Enum dispatch keeps the
//! call sites free of `dyn` and `async-trait`; adding a transport means a
//! new module, a new variant, and new match arms.
//!
//! Instances are cheap to clone (`reqwest::Client` is reference-counted),
//! so the console clones one into every in-flight request task.

mod http;
mod offline;

pub use http::HttpBackend;
pub use offline::OfflineBackend;

use thiserror::Error;

use crate::config::BackendConfig;
use crate::payload::{ChatResponse, HealthResponse};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("unknown backend provider: {0}")]
    UnknownProvider(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone)]
pub enum Backend {
    Http(HttpBackend),
    Offline(OfflineBackend),
}

impl Backend {
    /// Construct the backend named by `config.provider`.
    pub fn build(config: &BackendConfig) -> Result<Self, BackendError> {
        match config.provider.as_str() {
            "http" => Ok(Self::Http(HttpBackend::new(
                config.base_url.clone(),
                config.timeout_seconds,
            )?)),
            "offline" => Ok(Self::Offline(OfflineBackend)),
            other => Err(BackendError::UnknownProvider(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Offline(_) => "offline",
        }
    }

    /// Classify one user message. One round-trip, no retry.
    pub async fn classify(&self, message: &str) -> Result<ChatResponse, BackendError> {
        match self {
            Self::Http(b) => b.classify(message).await,
            Self::Offline(b) => b.classify(message).await,
        }
    }

    pub async fn health(&self) -> Result<HealthResponse, BackendError> {
        match self {
            Self::Http(b) => b.health().await,
            Self::Offline(b) => b.health().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> BackendConfig {
        BackendConfig {
            provider: provider.into(),
            base_url: "http://127.0.0.1:8000".into(),
            timeout_seconds: None,
        }
    }

    #[test]
    fn build_known_providers() {
        assert_eq!(Backend::build(&config("http")).unwrap().name(), "http");
        assert_eq!(Backend::build(&config("offline")).unwrap().name(), "offline");
    }

    #[test]
    fn build_unknown_provider_errors() {
        let err = Backend::build(&config("grpc")).unwrap_err();
        assert!(matches!(err, BackendError::UnknownProvider(p) if p == "grpc"));
    }

    #[test]
    fn status_error_display_carries_code_and_body() {
        let err = BackendError::Status { status: 503, body: "model loading".into() };
        assert_eq!(err.to_string(), "HTTP 503: model loading");
    }
}
