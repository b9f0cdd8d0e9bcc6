//! Crate-wide error taxonomy.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RcaError>;

#[derive(Debug, Error)]
pub enum RcaError {
    #[error("metric store unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("requested window out of range: {0}")]
    WindowOutOfRange(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("model protocol violation: {0}")]
    ModelProtocolViolation(String),

    #[error("probe inconclusive: {0}")]
    ProbeInconclusive(String),

    #[error("session expired or unknown: {0}")]
    SessionExpired(String),

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),
}

impl RcaError {
    /// Whether retrying the operation that produced this error could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RcaError::UpstreamUnavailable(_) | RcaError::Timeout(_))
    }
}
