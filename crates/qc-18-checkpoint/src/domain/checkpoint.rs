//! Checkpoint entity
//!
//! Checkpoints are numbered by the proposer: sequence `n` may only be
//! confirmed once `n - 1` checkpoints have been acknowledged.

use super::commitment::{Commitment, CommitmentHeader, CommitmentKind};
use crate::error::{CheckpointError, CheckpointResult};
use serde::{Deserialize, Serialize};

/// A periodic commitment of a sidechain block range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Position in the confirmed index (1-based)
    pub sequence_number: u64,
    pub header: CommitmentHeader,
}

impl Checkpoint {
    pub fn new(sequence_number: u64, header: CommitmentHeader) -> Self {
        Self {
            sequence_number,
            header,
        }
    }

    pub fn start_block(&self) -> u64 {
        self.header.start_block
    }

    pub fn end_block(&self) -> u64 {
        self.header.end_block
    }
}

impl Commitment for Checkpoint {
    type Id = u64;

    const KIND: CommitmentKind = CommitmentKind::Checkpoint;
    const CONTENT_ADDRESSED: bool = false;

    fn id(&self) -> u64 {
        self.sequence_number
    }

    fn header(&self) -> &CommitmentHeader {
        &self.header
    }

    fn claimed_number(&self) -> Option<u64> {
        Some(self.sequence_number)
    }

    fn id_key(id: &u64) -> Vec<u8> {
        id.to_be_bytes().to_vec()
    }

    fn number_for_id(id: &u64) -> Option<u64> {
        Some(*id)
    }

    fn validate(&self) -> CheckpointResult<()> {
        if self.sequence_number == 0 {
            return Err(CheckpointError::invalid("sequence numbers start at 1"));
        }
        self.header.validate()
    }
}
