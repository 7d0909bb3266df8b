//! ACK / no-ACK lifecycle
//!
//! ```text
//!            propose                accepted
//! [EMPTY] ───────────→ [BUFFERED] ───────────→ [CONFIRMED] ──→ [EMPTY]
//!    ↑                     │  │
//!    │                     │  └─ pending (within window) ─→ [BUFFERED]
//!    │                     │
//!    │                     └─ rejected / window expired ──→ [NO-ACKED]
//!    └────────────────────────────────────────────────────────────┘
//! ```
//!
//! A proposal landing in the same boundary goes straight back to BUFFERED.
//! This module holds the pure decision; persistence lives in `store`.

use super::commitment::{Commitment, CommitmentHeader};

/// Consensus outcome for the buffered commitment in one block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AckVerdict {
    /// No decision yet
    #[default]
    Pending,
    /// Quorum acknowledged the buffered commitment
    Accepted,
    /// Quorum rejected it
    Rejected,
}

/// What the consensus engine reports about one commitment kind at a commit
/// boundary.
#[derive(Clone, Debug)]
pub struct BoundaryInput<C> {
    pub verdict: AckVerdict,
    /// Fresh proposal to buffer once the verdict has been applied
    pub proposal: Option<C>,
}

impl<C> BoundaryInput<C> {
    pub fn idle() -> Self {
        Self {
            verdict: AckVerdict::Pending,
            proposal: None,
        }
    }

    pub fn verdict(verdict: AckVerdict) -> Self {
        Self {
            verdict,
            proposal: None,
        }
    }

    pub fn propose(proposal: C) -> Self {
        Self {
            verdict: AckVerdict::Pending,
            proposal: Some(proposal),
        }
    }

    pub fn with_proposal(mut self, proposal: C) -> Self {
        self.proposal = Some(proposal);
        self
    }
}

impl<C> Default for BoundaryInput<C> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Block context a boundary is evaluated in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockContext {
    pub height: u64,
    /// Block timestamp (unix seconds)
    pub timestamp: u64,
}

/// Decision for the buffered commitment, before any proposal is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Nothing buffered
    Idle,
    /// Keep waiting
    Hold,
    Confirm,
    NoAck { expired: bool },
    /// A verdict arrived with nothing buffered
    StrayVerdict,
}

/// Decide what happens to the buffered commitment at this boundary.
///
/// `ack_window_secs == 0` disables expiry.
pub fn decide(
    buffered: Option<&CommitmentHeader>,
    verdict: AckVerdict,
    block_time: u64,
    ack_window_secs: u64,
) -> Decision {
    let Some(header) = buffered else {
        return match verdict {
            AckVerdict::Pending => Decision::Idle,
            _ => Decision::StrayVerdict,
        };
    };

    match verdict {
        AckVerdict::Accepted => Decision::Confirm,
        AckVerdict::Rejected => Decision::NoAck { expired: false },
        AckVerdict::Pending => {
            let age = block_time.saturating_sub(header.timestamp);
            if ack_window_secs > 0 && age > ack_window_secs {
                Decision::NoAck { expired: true }
            } else {
                Decision::Hold
            }
        }
    }
}

/// Phase of one commitment kind between boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitmentPhase<Id> {
    Empty,
    Buffered(Id),
}

/// What happened to the buffered commitment at a boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionOutcome<C: Commitment> {
    Idle,
    StillBuffered(C::Id),
    Confirmed { commitment: C, number: u64 },
    NoAcked { id: C::Id, timestamp: u64, expired: bool },
}

/// Result of evaluating one commit boundary for one commitment kind.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionReport<C: Commitment> {
    pub outcome: TransitionOutcome<C>,
    /// Phase after the boundary, proposal included
    pub phase: CommitmentPhase<C::Id>,
}

impl<C: Commitment> TransitionReport<C> {
    pub fn confirmed_number(&self) -> Option<u64> {
        match &self.outcome {
            TransitionOutcome::Confirmed { number, .. } => Some(*number),
            _ => None,
        }
    }

    pub fn is_no_ack(&self) -> bool {
        matches!(self.outcome, TransitionOutcome::NoAcked { .. })
    }
}
