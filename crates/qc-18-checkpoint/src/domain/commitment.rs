//! Commitment abstraction shared by checkpoints and milestones
//!
//! Both commitments cover a contiguous range of sidechain blocks and go
//! through the same buffered → confirmed / no-ACK lifecycle. They differ only
//! in how they are identified, which is what the [`Commitment`] trait captures.

use crate::error::{CheckpointError, CheckpointResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// A 32-byte hash (root hashes, tx hashes).
pub type Hash = [u8; 32];

/// A 20-byte proposer address.
pub type Address = [u8; 20];

/// Which lifecycle a commitment belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommitmentKind {
    Checkpoint,
    Milestone,
}

impl CommitmentKind {
    /// Key namespace in the state accessor.
    pub fn namespace(&self) -> &'static str {
        match self {
            CommitmentKind::Checkpoint => "checkpoint",
            CommitmentKind::Milestone => "milestone",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.namespace()
    }
}

impl Display for CommitmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Block range and provenance carried by every commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentHeader {
    /// First sidechain block covered (inclusive)
    pub start_block: u64,
    /// Last sidechain block covered (inclusive)
    pub end_block: u64,
    /// Root hash over the covered block headers
    pub root_hash: Hash,
    /// Validator that proposed the commitment
    pub proposer: Address,
    /// Sidechain identifier
    pub bor_chain_id: String,
    /// Proposal time (unix seconds)
    pub timestamp: u64,
}

impl CommitmentHeader {
    pub fn new(
        start_block: u64,
        end_block: u64,
        root_hash: Hash,
        proposer: Address,
        bor_chain_id: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            start_block,
            end_block,
            root_hash,
            proposer,
            bor_chain_id: bor_chain_id.into(),
            timestamp,
        }
    }

    /// Whether `height` falls inside the covered range.
    pub fn contains(&self, height: u64) -> bool {
        self.start_block <= height && height <= self.end_block
    }

    /// Number of blocks covered.
    pub fn len(&self) -> u64 {
        self.end_block.saturating_sub(self.start_block) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end_block < self.start_block
    }

    /// Proposal-shape checks shared by both commitment kinds.
    pub fn validate(&self) -> CheckpointResult<()> {
        if self.start_block > self.end_block {
            return Err(CheckpointError::invalid(format!(
                "start block {} is after end block {}",
                self.start_block, self.end_block
            )));
        }
        if self.root_hash == [0u8; 32] {
            return Err(CheckpointError::invalid("root hash is empty"));
        }
        if self.bor_chain_id.trim().is_empty() {
            return Err(CheckpointError::invalid("bor chain id is empty"));
        }
        if self.timestamp == 0 {
            return Err(CheckpointError::invalid("timestamp is zero"));
        }
        Ok(())
    }
}

/// A block-range commitment with an ACK / no-ACK lifecycle.
pub trait Commitment:
    Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Identifier of a single commitment.
    type Id: Clone + Debug + Display + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    const KIND: CommitmentKind;

    /// Content-addressed commitments keep a by-id index and per-id no-ACK
    /// records; sequence-numbered ones do not need either.
    const CONTENT_ADDRESSED: bool;

    fn id(&self) -> Self::Id;

    fn header(&self) -> &CommitmentHeader;

    /// Position in the confirmed index this commitment claims, if any.
    /// `None` means the store assigns the next free number on confirm.
    fn claimed_number(&self) -> Option<u64>;

    /// Raw key suffix for per-id records.
    fn id_key(id: &Self::Id) -> Vec<u8>;

    /// Confirmed-index position implied by an id, for kinds whose id is the
    /// position itself.
    fn number_for_id(_id: &Self::Id) -> Option<u64> {
        None
    }

    /// Full proposal validation.
    fn validate(&self) -> CheckpointResult<()> {
        self.header().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> CommitmentHeader {
        CommitmentHeader::new(100, 200, [7u8; 32], [1u8; 20], "137", 1_700_000_000)
    }

    #[test]
    fn test_header_range() {
        let h = header();
        assert!(h.contains(100));
        assert!(h.contains(200));
        assert!(!h.contains(201));
        assert_eq!(h.len(), 101);
    }

    #[test]
    fn test_header_validation() {
        assert!(header().validate().is_ok());

        let mut reversed = header();
        reversed.start_block = 300;
        assert!(matches!(
            reversed.validate(),
            Err(CheckpointError::InvalidArgument { .. })
        ));

        let mut no_root = header();
        no_root.root_hash = [0u8; 32];
        assert!(no_root.validate().is_err());

        let mut no_chain = header();
        no_chain.bor_chain_id = "  ".to_string();
        assert!(no_chain.validate().is_err());
    }

    #[test]
    fn test_single_block_range_is_valid() {
        let mut h = header();
        h.end_block = h.start_block;
        assert!(h.validate().is_ok());
        assert_eq!(h.len(), 1);
    }
}
