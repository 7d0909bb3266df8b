//! Error types for the State Sync relay

use thiserror::Error;

/// State sync errors
#[derive(Debug, Error)]
pub enum StateSyncError {
    /// Malformed request (zero limit, bad endpoint, ...)
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Upstream fetch failed - transient, the consumer may retry
    #[error("Upstream unavailable: {reason}")]
    UpstreamUnavailable { reason: String },

    /// Upstream payload could not be decoded
    #[error("Encoding error: {reason}")]
    EncodingError { reason: String },

    /// The consumer went away mid-stream
    #[error("Transport closed")]
    TransportClosed,
}

impl StateSyncError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable { .. })
    }
}

impl From<reqwest::Error> for StateSyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::EncodingError {
                reason: e.to_string(),
            }
        } else {
            Self::UpstreamUnavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Result type for state sync operations
pub type StateSyncResult<T> = Result<T, StateSyncError>;
