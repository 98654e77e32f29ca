//! Common Error Types for the Mint Watcher
//!
//! Provides unified error handling for the binary and embedding code.

use thiserror::Error;

use crate::mint_tracker::{SourceError, TrackerError};

/// Root error type for the mint watcher
#[derive(Debug, Error)]
pub enum MintWatchError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] super::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] super::logging::LoggingError),

    /// Engine lifecycle errors
    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    /// Ledger collaborator errors
    #[error("solana error: {0}")]
    Source(#[from] SourceError),

    /// API errors
    #[error("API error: {0}")]
    Api(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MintWatchError {
    /// Create an API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            MintWatchError::Source(err) => err.is_transient(),
            MintWatchError::Tracker(TrackerError::Source(err)) => err.is_transient(),
            MintWatchError::Tracker(TrackerError::SeedFailed(_)) => true,
            MintWatchError::Io(_) => true,
            _ => false,
        }
    }

    /// Get error code for API responses and logs
    pub fn error_code(&self) -> &'static str {
        match self {
            MintWatchError::Config(_) => "CONFIG_ERROR",
            MintWatchError::Logging(_) => "LOGGING_ERROR",
            MintWatchError::Tracker(_) => "TRACKER_ERROR",
            MintWatchError::Source(_) => "SOLANA_ERROR",
            MintWatchError::Api(_) => "API_ERROR",
            MintWatchError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using MintWatchError
pub type Result<T> = std::result::Result<T, MintWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = MintWatchError::from(SourceError::Rpc("connection refused".to_string()));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.error_code(), "SOLANA_ERROR");
        assert_eq!(MintWatchError::api("bind").error_code(), "API_ERROR");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(MintWatchError::from(SourceError::Timeout).is_retryable());
        assert!(MintWatchError::from(TrackerError::SeedFailed("rpc".into())).is_retryable());
        assert!(!MintWatchError::from(SourceError::MalformedPayload("x".into())).is_retryable());
        assert!(!MintWatchError::api("bad request").is_retryable());
    }
}
