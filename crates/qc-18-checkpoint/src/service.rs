//! Checkpoint Service - ACK / no-ACK bookkeeping on the commit path
//!
//! One generic [`AckStateMachine`] per commitment kind, both writing to the
//! same state accessor. A commit boundary is planned against the current
//! committed state and written back as ONE atomic batch, so the checkpoint
//! and milestone transitions of a block land together or not at all.
//!
//! The service never retries and never spawns work: store faults go straight
//! back to the consensus engine, which fails the block.
//!
//! Proposals submitted between blocks are staged in memory and folded into
//! the next boundary that carries no proposal of its own.

use crate::domain::{
    decide, BlockContext, BoundaryInput, Checkpoint, Commitment, CommitmentPhase, Decision,
    Milestone, MilestoneId, TransitionOutcome, TransitionReport,
};
use crate::error::{CheckpointError, CheckpointResult};
use crate::metrics;
use crate::ports::inbound::{BlockCommit, CheckpointApi, CheckpointQueryApi, CommitReport};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use crate::store::{CommitmentStore, SharedStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Checkpoint subsystem configuration
#[derive(Clone, Debug)]
pub struct CheckpointConfig {
    /// Seconds a buffered checkpoint may wait for its ACK (0 = no expiry)
    pub checkpoint_ack_window_secs: u64,
    /// Seconds a buffered milestone may wait for its ACK (0 = no expiry)
    pub milestone_ack_window_secs: u64,
    /// Seconds proposers wait after a no-ACK before re-proposing
    pub no_ack_backoff_secs: u64,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            checkpoint_ack_window_secs: 1000,
            milestone_ack_window_secs: 120,
            no_ack_backoff_secs: 1800,
        }
    }
}

/// ACK / no-ACK state machine for one commitment kind.
pub struct AckStateMachine<C, S> {
    store: CommitmentStore<C, S>,
    ack_window_secs: u64,
}

impl<C: Commitment, S: KeyValueStore> AckStateMachine<C, S> {
    pub fn new(store: CommitmentStore<C, S>, ack_window_secs: u64) -> Self {
        Self {
            store,
            ack_window_secs,
        }
    }

    pub fn store(&self) -> &CommitmentStore<C, S> {
        &self.store
    }

    /// Plan the transition for one boundary against committed state `kv`.
    ///
    /// Returns the report and the batch that realises it; nothing is written.
    pub fn plan(
        &self,
        kv: &S,
        block: &BlockContext,
        input: &BoundaryInput<C>,
    ) -> CheckpointResult<(TransitionReport<C>, Vec<BatchOperation>)> {
        if let Some(proposal) = &input.proposal {
            proposal.validate()?;
        }

        let buffered = self.store.buffered_in(kv)?;
        let decision = decide(
            buffered.as_ref().map(|c| c.header()),
            input.verdict,
            block.timestamp,
            self.ack_window_secs,
        );

        let mut ops = Vec::new();
        let outcome = match (decision, buffered) {
            (Decision::Confirm, Some(commitment)) => {
                let (number, confirm_ops) = self.store.confirm_ops(kv, &commitment)?;
                ops.extend(confirm_ops);
                TransitionOutcome::Confirmed { commitment, number }
            }
            (Decision::NoAck { expired }, Some(commitment)) => {
                let id = commitment.id();
                ops.extend(self.store.no_ack_ops(&id, block.timestamp)?);
                TransitionOutcome::NoAcked {
                    id,
                    timestamp: block.timestamp,
                    expired,
                }
            }
            (Decision::Hold, Some(commitment)) => TransitionOutcome::StillBuffered(commitment.id()),
            (Decision::StrayVerdict, _) => {
                warn!(
                    "[qc-18] {:?} verdict for {} at height {} with nothing buffered, ignoring",
                    input.verdict,
                    C::KIND,
                    block.height
                );
                TransitionOutcome::Idle
            }
            _ => TransitionOutcome::Idle,
        };

        if let Some(proposal) = &input.proposal {
            self.check_sequence(kv, proposal, &outcome)?;
        }

        let phase = match (&input.proposal, &outcome) {
            (Some(proposal), outcome) => {
                if let TransitionOutcome::StillBuffered(pending) = outcome {
                    debug!(
                        "[qc-18] {} {} replaces pending {} at height {}",
                        C::KIND,
                        proposal.id(),
                        pending,
                        block.height
                    );
                }
                ops.extend(self.store.set_buffered_ops(proposal)?);
                CommitmentPhase::Buffered(proposal.id())
            }
            (None, TransitionOutcome::StillBuffered(id)) => CommitmentPhase::Buffered(id.clone()),
            (None, _) => CommitmentPhase::Empty,
        };

        Ok((TransitionReport { outcome, phase }, ops))
    }

    /// A numbered proposal must claim the number right after the count this
    /// boundary leaves behind.
    fn check_sequence(
        &self,
        kv: &S,
        proposal: &C,
        outcome: &TransitionOutcome<C>,
    ) -> CheckpointResult<()> {
        let Some(claimed) = proposal.claimed_number() else {
            return Ok(());
        };
        let count = match outcome {
            TransitionOutcome::Confirmed { number, .. } => *number,
            _ => self.store.count_in(kv)?,
        };
        next_in_sequence::<C>(claimed, count)
    }

    /// Whether the last no-ACK is still inside the backoff window at `now`.
    pub fn backoff_active(&self, now: u64, backoff_secs: u64) -> CheckpointResult<bool> {
        Ok(self
            .store
            .last_no_ack_time()?
            .is_some_and(|last| now.saturating_sub(last) < backoff_secs))
    }
}

#[derive(Default)]
struct StagedProposals {
    checkpoint: Option<Checkpoint>,
    milestone: Option<Milestone>,
}

/// Checkpoint Service implementation
pub struct CheckpointService<S> {
    config: CheckpointConfig,
    kv: SharedStore<S>,
    checkpoints: AckStateMachine<Checkpoint, S>,
    milestones: AckStateMachine<Milestone, S>,
    staged: Mutex<StagedProposals>,
}

impl<S: KeyValueStore> CheckpointService<S> {
    /// Create the service over an injected state accessor.
    pub fn new(config: CheckpointConfig, kv: SharedStore<S>) -> Self {
        let checkpoints = AckStateMachine::new(
            CommitmentStore::new(Arc::clone(&kv)),
            config.checkpoint_ack_window_secs,
        );
        let milestones = AckStateMachine::new(
            CommitmentStore::new(Arc::clone(&kv)),
            config.milestone_ack_window_secs,
        );
        Self {
            config,
            kv,
            checkpoints,
            milestones,
            staged: Mutex::new(StagedProposals::default()),
        }
    }

    pub fn config(&self) -> &CheckpointConfig {
        &self.config
    }

    pub fn checkpoints(&self) -> &CommitmentStore<Checkpoint, S> {
        self.checkpoints.store()
    }

    pub fn milestones(&self) -> &CommitmentStore<Milestone, S> {
        self.milestones.store()
    }

    fn observe<C: Commitment>(height: u64, report: &TransitionReport<C>) {
        match &report.outcome {
            TransitionOutcome::Confirmed { commitment, number } => {
                let header = commitment.header();
                info!(
                    "[qc-18] {} {} confirmed at height {} (blocks {}-{}, count {})",
                    C::KIND,
                    commitment.id(),
                    height,
                    header.start_block,
                    header.end_block,
                    number
                );
                metrics::record_confirmed(C::KIND.as_str(), *number);
            }
            TransitionOutcome::NoAcked {
                id,
                timestamp,
                expired,
            } => {
                warn!(
                    "[qc-18] {} {} not acknowledged at height {} (expired: {}, no-ack time {})",
                    C::KIND,
                    id,
                    height,
                    expired,
                    timestamp
                );
                metrics::record_no_ack(C::KIND.as_str(), *expired);
            }
            TransitionOutcome::Idle | TransitionOutcome::StillBuffered(_) => {}
        }
        metrics::set_buffered(
            C::KIND.as_str(),
            matches!(report.phase, CommitmentPhase::Buffered(_)),
        );
    }
}

fn next_in_sequence<C: Commitment>(claimed: u64, count: u64) -> CheckpointResult<()> {
    if claimed <= count {
        return Err(CheckpointError::AlreadyConfirmed {
            kind: C::KIND.as_str(),
            id: claimed.to_string(),
        });
    }
    if claimed - count != 1 {
        return Err(CheckpointError::invalid(format!(
            "{} {} out of sequence, next expected is {}",
            C::KIND,
            claimed,
            count + 1
        )));
    }
    Ok(())
}

impl<S: KeyValueStore> CheckpointApi for CheckpointService<S> {
    fn process_commit(&self, mut commit: BlockCommit) -> CheckpointResult<CommitReport> {
        let mut staged = self.staged.lock();
        let staged_checkpoint = commit.checkpoint.proposal.is_none() && staged.checkpoint.is_some();
        if staged_checkpoint {
            commit.checkpoint.proposal = staged.checkpoint.clone();
        }
        let staged_milestone = commit.milestone.proposal.is_none() && staged.milestone.is_some();
        if staged_milestone {
            commit.milestone.proposal = staged.milestone.clone();
        }

        let (checkpoint, milestone) = {
            let mut kv = self.kv.write();
            let (checkpoint, mut ops) =
                match self.checkpoints.plan(&*kv, &commit.block, &commit.checkpoint) {
                    Err(
                        e @ (CheckpointError::AlreadyConfirmed { .. }
                        | CheckpointError::InvalidArgument { .. }),
                    ) if staged_checkpoint => {
                        warn!(
                            "[qc-18] dropping staged checkpoint at height {}: {}",
                            commit.block.height, e
                        );
                        commit.checkpoint.proposal = None;
                        self.checkpoints
                            .plan(&*kv, &commit.block, &commit.checkpoint)?
                    }
                    planned => planned?,
                };
            let (milestone, milestone_ops) =
                self.milestones
                    .plan(&*kv, &commit.block, &commit.milestone)?;
            ops.extend(milestone_ops);

            if !ops.is_empty() {
                kv.atomic_batch_write(ops)?;
            }
            (checkpoint, milestone)
        };

        // Staged proposals survive a failed boundary.
        if staged_checkpoint {
            staged.checkpoint = None;
        }
        if staged_milestone {
            staged.milestone = None;
        }
        drop(staged);

        Self::observe(commit.block.height, &checkpoint);
        Self::observe(commit.block.height, &milestone);

        Ok(CommitReport {
            height: commit.block.height,
            checkpoint,
            milestone,
        })
    }

    fn validate_checkpoint(&self, checkpoint: &Checkpoint) -> CheckpointResult<()> {
        checkpoint.validate()
    }

    fn validate_milestone(&self, milestone: &Milestone) -> CheckpointResult<()> {
        milestone.validate()
    }

    fn submit_checkpoint(&self, checkpoint: Checkpoint) -> CheckpointResult<()> {
        checkpoint.validate()?;
        next_in_sequence::<Checkpoint>(checkpoint.sequence_number, self.checkpoints().count()?)?;
        debug!(
            "[qc-18] staged checkpoint {} (blocks {}-{})",
            checkpoint.sequence_number,
            checkpoint.start_block(),
            checkpoint.end_block()
        );
        self.staged.lock().checkpoint = Some(checkpoint);
        Ok(())
    }

    fn submit_milestone(&self, milestone: Milestone) -> CheckpointResult<()> {
        milestone.validate()?;
        if self.milestones().number_of(&milestone.milestone_id)?.is_some() {
            return Err(CheckpointError::AlreadyConfirmed {
                kind: Milestone::KIND.as_str(),
                id: milestone.milestone_id.to_string(),
            });
        }
        debug!("[qc-18] staged milestone {}", milestone.milestone_id);
        self.staged.lock().milestone = Some(milestone);
        Ok(())
    }

    fn checkpoint_backoff_active(&self, now: u64) -> CheckpointResult<bool> {
        self.checkpoints
            .backoff_active(now, self.config.no_ack_backoff_secs)
    }

    fn milestone_backoff_active(&self, now: u64) -> CheckpointResult<bool> {
        self.milestones
            .backoff_active(now, self.config.no_ack_backoff_secs)
    }
}

impl<S: KeyValueStore> CheckpointQueryApi for CheckpointService<S> {
    fn buffered_checkpoint(&self) -> CheckpointResult<Option<Checkpoint>> {
        self.checkpoints().buffered()
    }

    fn checkpoint_by_sequence(&self, sequence: u64) -> CheckpointResult<Option<Checkpoint>> {
        self.checkpoints().confirmed(sequence)
    }

    fn latest_checkpoint(&self) -> CheckpointResult<Option<Checkpoint>> {
        self.checkpoints().latest_confirmed()
    }

    fn checkpoint_containing(&self, height: u64) -> CheckpointResult<Option<Checkpoint>> {
        self.checkpoints().confirmed_containing(height)
    }

    fn ack_count(&self) -> CheckpointResult<u64> {
        self.checkpoints().count()
    }

    fn checkpoint_last_no_ack_time(&self) -> CheckpointResult<Option<u64>> {
        self.checkpoints().last_no_ack_time()
    }

    fn buffered_milestone(&self) -> CheckpointResult<Option<Milestone>> {
        self.milestones().buffered()
    }

    fn latest_milestone(&self) -> CheckpointResult<Option<Milestone>> {
        self.milestones().latest_confirmed()
    }

    fn milestone_by_number(&self, number: u64) -> CheckpointResult<Option<Milestone>> {
        self.milestones().confirmed(number)
    }

    fn milestone_count(&self) -> CheckpointResult<u64> {
        self.milestones().count()
    }

    fn milestone_last_no_ack_time(&self) -> CheckpointResult<Option<u64>> {
        self.milestones().last_no_ack_time()
    }

    fn last_no_ack_milestone(&self) -> CheckpointResult<Option<MilestoneId>> {
        self.milestones().last_no_ack_id()
    }

    fn no_ack_milestone(&self, id: &MilestoneId) -> CheckpointResult<Option<u64>> {
        self.milestones().no_ack_time(id)
    }
}
