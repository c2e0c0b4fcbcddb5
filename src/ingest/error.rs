// src/ingest/error.rs
use thiserror::Error;

/// Low-level failure of a single GET.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Why one request variant (or one endpoint) did not produce posts.
/// Only the most recent one is kept for classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("TLS handshake failed: {0}")]
    Tls(String),

    #[error("HTTP {status} {reason}")]
    Status { status: u16, reason: String },

    #[error("response body is not JSON: {0}")]
    Decode(String),

    #[error("response carried no post listing")]
    Rejected,

    #[error("no post passed the content filter")]
    NothingAdmitted,

    #[error("{0}")]
    Other(String),
}

impl AttemptError {
    pub fn from_status(status: u16) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        AttemptError::Status { status, reason }
    }
}

impl From<TransportError> for AttemptError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(d) => AttemptError::Timeout(d),
            TransportError::Tls(d) => AttemptError::Tls(d),
            TransportError::Connect(d) => AttemptError::Connection(d),
            TransportError::Other(d) => AttemptError::Other(d),
        }
    }
}

impl From<serde_json::Error> for AttemptError {
    fn from(err: serde_json::Error) -> Self {
        AttemptError::Decode(err.to_string())
    }
}
