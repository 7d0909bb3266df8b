//! Driving Ports (API - Inbound)
//!
//! `CheckpointApi` is driven by the consensus engine once per committed
//! block. `CheckpointQueryApi` is the read-only surface the REST/CLI layer
//! consumes; every accessor returns `Ok(None)` when there is no data, so
//! "no content" stays distinct from a store fault.

use crate::domain::{
    BlockContext, BoundaryInput, Checkpoint, Milestone, MilestoneId, TransitionReport,
};
use crate::error::CheckpointResult;
use std::sync::Arc;

/// Everything the consensus engine reports at one commit boundary.
#[derive(Clone, Debug)]
pub struct BlockCommit {
    pub block: BlockContext,
    pub checkpoint: BoundaryInput<Checkpoint>,
    pub milestone: BoundaryInput<Milestone>,
}

impl BlockCommit {
    /// A block with no commitment activity.
    pub fn empty(height: u64, timestamp: u64) -> Self {
        Self {
            block: BlockContext { height, timestamp },
            checkpoint: BoundaryInput::idle(),
            milestone: BoundaryInput::idle(),
        }
    }

    pub fn with_checkpoint(mut self, input: BoundaryInput<Checkpoint>) -> Self {
        self.checkpoint = input;
        self
    }

    pub fn with_milestone(mut self, input: BoundaryInput<Milestone>) -> Self {
        self.milestone = input;
        self
    }
}

/// Outcome of one commit boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitReport {
    pub height: u64,
    pub checkpoint: TransitionReport<Checkpoint>,
    pub milestone: TransitionReport<Milestone>,
}

/// Commit-path API.
pub trait CheckpointApi: Send + Sync {
    /// Evaluate one commit boundary. Store faults are returned, never
    /// swallowed; the caller must fail the block.
    fn process_commit(&self, commit: BlockCommit) -> CheckpointResult<CommitReport>;

    /// Submission-side validation of a checkpoint proposal.
    fn validate_checkpoint(&self, checkpoint: &Checkpoint) -> CheckpointResult<()>;

    /// Submission-side validation of a milestone proposal.
    fn validate_milestone(&self, milestone: &Milestone) -> CheckpointResult<()>;

    /// Validate and stage a checkpoint for the next commit boundary.
    fn submit_checkpoint(&self, checkpoint: Checkpoint) -> CheckpointResult<()>;

    /// Validate and stage a milestone for the next commit boundary.
    fn submit_milestone(&self, milestone: Milestone) -> CheckpointResult<()>;

    /// Whether a checkpoint proposer should still back off after the last
    /// no-ACK, as of `now`.
    fn checkpoint_backoff_active(&self, now: u64) -> CheckpointResult<bool>;

    /// Same for milestone proposers.
    fn milestone_backoff_active(&self, now: u64) -> CheckpointResult<bool>;
}

/// Read-only state query surface.
pub trait CheckpointQueryApi: Send + Sync {
    fn buffered_checkpoint(&self) -> CheckpointResult<Option<Checkpoint>>;

    fn checkpoint_by_sequence(&self, sequence: u64) -> CheckpointResult<Option<Checkpoint>>;

    fn latest_checkpoint(&self) -> CheckpointResult<Option<Checkpoint>>;

    /// Confirmed checkpoint covering a sidechain block height.
    fn checkpoint_containing(&self, height: u64) -> CheckpointResult<Option<Checkpoint>>;

    fn ack_count(&self) -> CheckpointResult<u64>;

    fn checkpoint_last_no_ack_time(&self) -> CheckpointResult<Option<u64>>;

    fn buffered_milestone(&self) -> CheckpointResult<Option<Milestone>>;

    fn latest_milestone(&self) -> CheckpointResult<Option<Milestone>>;

    fn milestone_by_number(&self, number: u64) -> CheckpointResult<Option<Milestone>>;

    fn milestone_count(&self) -> CheckpointResult<u64>;

    fn milestone_last_no_ack_time(&self) -> CheckpointResult<Option<u64>>;

    fn last_no_ack_milestone(&self) -> CheckpointResult<Option<MilestoneId>>;

    fn no_ack_milestone(&self, id: &MilestoneId) -> CheckpointResult<Option<u64>>;
}

impl<T: CheckpointQueryApi + ?Sized> CheckpointQueryApi for Arc<T> {
    fn buffered_checkpoint(&self) -> CheckpointResult<Option<Checkpoint>> {
        (**self).buffered_checkpoint()
    }

    fn checkpoint_by_sequence(&self, sequence: u64) -> CheckpointResult<Option<Checkpoint>> {
        (**self).checkpoint_by_sequence(sequence)
    }

    fn latest_checkpoint(&self) -> CheckpointResult<Option<Checkpoint>> {
        (**self).latest_checkpoint()
    }

    fn checkpoint_containing(&self, height: u64) -> CheckpointResult<Option<Checkpoint>> {
        (**self).checkpoint_containing(height)
    }

    fn ack_count(&self) -> CheckpointResult<u64> {
        (**self).ack_count()
    }

    fn checkpoint_last_no_ack_time(&self) -> CheckpointResult<Option<u64>> {
        (**self).checkpoint_last_no_ack_time()
    }

    fn buffered_milestone(&self) -> CheckpointResult<Option<Milestone>> {
        (**self).buffered_milestone()
    }

    fn latest_milestone(&self) -> CheckpointResult<Option<Milestone>> {
        (**self).latest_milestone()
    }

    fn milestone_by_number(&self, number: u64) -> CheckpointResult<Option<Milestone>> {
        (**self).milestone_by_number(number)
    }

    fn milestone_count(&self) -> CheckpointResult<u64> {
        (**self).milestone_count()
    }

    fn milestone_last_no_ack_time(&self) -> CheckpointResult<Option<u64>> {
        (**self).milestone_last_no_ack_time()
    }

    fn last_no_ack_milestone(&self) -> CheckpointResult<Option<MilestoneId>> {
        (**self).last_no_ack_milestone()
    }

    fn no_ack_milestone(&self, id: &MilestoneId) -> CheckpointResult<Option<u64>> {
        (**self).no_ack_milestone(id)
    }
}
