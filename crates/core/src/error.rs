//! Error types for the governance pipeline.

use thiserror::Error;

/// Result type alias using the governor's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the governor.
///
/// Only [`Error::Configuration`] is allowed to escape to a process boundary.
/// Everything else is recovered inside the pipeline so that a decision is
/// always produced for a well-formed request.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Remote Backend Errors
    // =========================================================================
    #[error("Remote analysis unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote analysis returned a malformed payload: {0}")]
    RemoteAnalysisMalformed(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // =========================================================================
    // Startup Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Generic Errors
    // =========================================================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a remote-unavailable error.
    pub fn remote_unavailable(msg: impl Into<String>) -> Self {
        Self::RemoteUnavailable(msg.into())
    }

    /// Create a malformed-payload error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::RemoteAnalysisMalformed(msg.into())
    }

    /// Create a persistence error.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an internal error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for failures that trigger a fallback to the local rule engine.
    pub fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable(_) | Self::RemoteAnalysisMalformed(_)
        )
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
