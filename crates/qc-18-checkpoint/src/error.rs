//! Error types for the Checkpoint subsystem
//!
//! Absence of data is never an error here: lookups return `Ok(None)`.
//! Everything below is either a caller mistake, a backing-store fault or a
//! bookkeeping invariant that must not be broken.

use thiserror::Error;

/// Errors raised by the key-value state accessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// Underlying I/O failure.
    #[error("I/O error: {message}")]
    IOError { message: String },

    /// Store is unavailable (closed, locked by another process, ...).
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
}

/// Checkpoint subsystem errors
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Malformed request parameters or an invalid proposal
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Backing store fault - transient, the caller fails the block
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] KVStoreError),

    /// Bookkeeping invariant would be broken; stored state is untouched
    #[error("State invariant violation: {reason}")]
    StateInvariantViolation { reason: String },

    /// Commitment was already confirmed; stored state is untouched
    #[error("{kind} {id} already confirmed")]
    AlreadyConfirmed { kind: &'static str, id: String },

    /// Stored payload could not be decoded
    #[error("Encoding error for key {key}: {reason}")]
    EncodingError { key: String, reason: String },
}

impl CheckpointError {
    /// Convenience constructor for proposal / parameter failures.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable(_))
    }
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;
