//! # qc-18-checkpoint
//!
//! Checkpoint Coordinator: buffers checkpoint and milestone proposals and keeps
//! the ACK / no-ACK books for them.
//!
//! ## Overview
//!
//! This subsystem provides:
//! - **Buffering**: at most one checkpoint and one milestone awaiting a verdict
//! - **Confirmed index**: contiguous, 1-based, with an ack count per kind
//! - **No-ACK tracking**: last no-ACK time, per-id for milestones
//! - **Atomic boundaries**: one batch write per committed block
//!
//! ## Architecture
//!
//! ```text
//! Consensus ──BlockCommit──→ CheckpointService ──atomic batch──→ KeyValueStore
//!                                   │
//!                                   └── CheckpointQueryApi ──→ QueryHandler (REST/CLI)
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! [EMPTY] ──propose──→ [BUFFERED] ──accepted──→ [CONFIRMED]
//!                          │
//!                          └── rejected / ack window expired ──→ [NO-ACKED]
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_18_checkpoint::{BlockCommit, BoundaryInput, CheckpointConfig, CheckpointService};
//! use qc_18_checkpoint::ports::inbound::CheckpointApi;
//!
//! let service = CheckpointService::new(CheckpointConfig::default(), kv);
//!
//! service.process_commit(
//!     BlockCommit::empty(height, timestamp).with_checkpoint(BoundaryInput::propose(checkpoint)),
//! )?;
//! ```

pub mod api;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod store;

pub use api::{CheckpointQuery, QueryHandler, QueryResponse, QueryStatus};
pub use domain::{
    AckVerdict, BlockContext, BoundaryInput, Checkpoint, Commitment, CommitmentHeader,
    CommitmentKind, CommitmentPhase, Milestone, MilestoneId, TransitionOutcome, TransitionReport,
};
pub use error::{CheckpointError, CheckpointResult, KVStoreError};
pub use ports::inbound::{BlockCommit, CheckpointApi, CheckpointQueryApi, CommitReport};
pub use ports::outbound::{BatchOperation, FileBackedKVStore, InMemoryKVStore, KeyValueStore};
pub use service::{AckStateMachine, CheckpointConfig, CheckpointService};
pub use store::{CommitmentStore, SharedStore};
