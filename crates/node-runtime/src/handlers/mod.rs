//! # Event Handlers
//!
//! Long-running tasks that feed requests from channels into the subsystems.

pub mod commit;
pub mod state_sync;

pub use commit::{CommitClient, CommitHandler, CommitRequest};
pub use state_sync::{EventStream, StateSyncClient, StateSyncHandler, StreamSubscription};

use qc_18_checkpoint::CheckpointError;
use qc_19_state_sync::StateSyncError;
use thiserror::Error;

/// Errors seen by handler clients.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler task is gone (shutdown or crash)
    #[error("handler closed")]
    Closed,

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    StateSync(#[from] StateSyncError),
}
