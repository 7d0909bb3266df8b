//! Domain module for the Checkpoint subsystem
//!
//! - commitment: block-range commitment abstraction
//! - checkpoint / milestone: the two commitment kinds
//! - keys: persisted key layout
//! - state_machine: ACK / no-ACK decision

pub mod checkpoint;
pub mod commitment;
pub mod keys;
pub mod milestone;
pub mod state_machine;

pub use checkpoint::Checkpoint;
pub use commitment::{Address, Commitment, CommitmentHeader, CommitmentKind, Hash};
pub use keys::CommitmentKeys;
pub use milestone::{Milestone, MilestoneId};
pub use state_machine::{
    decide, AckVerdict, BlockContext, BoundaryInput, CommitmentPhase, Decision,
    TransitionOutcome, TransitionReport,
};
