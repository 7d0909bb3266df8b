//! Milestone entity
//!
//! Milestones are the fast-finality sibling of checkpoints. They carry no
//! sequence number; their identity is derived from their content, and the
//! store numbers them in confirmation order.

use super::commitment::{Commitment, CommitmentHeader, CommitmentKind};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

/// Content-derived milestone identifier (`0x`-prefixed Keccak-256 hex).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MilestoneId(pub String);

impl MilestoneId {
    /// Derive the identifier from the milestone's content.
    pub fn derive(header: &CommitmentHeader) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(header.proposer);
        hasher.update(header.start_block.to_be_bytes());
        hasher.update(header.end_block.to_be_bytes());
        hasher.update(header.root_hash);
        hasher.update(header.bor_chain_id.as_bytes());
        hasher.update(header.timestamp.to_be_bytes());
        Self(format!("0x{}", hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MilestoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MilestoneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A fast-finality commitment of a sidechain block range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub milestone_id: MilestoneId,
    pub header: CommitmentHeader,
}

impl Milestone {
    /// Build a milestone, deriving its identifier from the header.
    pub fn new(header: CommitmentHeader) -> Self {
        Self {
            milestone_id: MilestoneId::derive(&header),
            header,
        }
    }
}

impl Commitment for Milestone {
    type Id = MilestoneId;

    const KIND: CommitmentKind = CommitmentKind::Milestone;
    const CONTENT_ADDRESSED: bool = true;

    fn id(&self) -> MilestoneId {
        self.milestone_id.clone()
    }

    fn header(&self) -> &CommitmentHeader {
        &self.header
    }

    fn claimed_number(&self) -> Option<u64> {
        None
    }

    fn id_key(id: &MilestoneId) -> Vec<u8> {
        id.0.as_bytes().to_vec()
    }
}
