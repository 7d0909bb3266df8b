//! Persisted key layout
//!
//! ```text
//! checkpoint/buffer                 buffered checkpoint
//! checkpoint/ack-count              AckCount
//! checkpoint/confirmed/<be u64>     confirmed checkpoint by sequence
//! checkpoint/last-no-ack            last no-ACK time
//!
//! milestone/buffer                  buffered milestone
//! milestone/count                   MilestoneCount
//! milestone/confirmed/<be u64>      confirmed milestone by number
//! milestone/by-id/<id>              number of a confirmed milestone
//! milestone/last-no-ack             last no-ACK time
//! milestone/last-no-ack-id          id of the last no-ACK'd milestone
//! milestone/no-ack/<id>             no-ACK time per milestone id
//! ```

use super::commitment::CommitmentKind;

/// Key builder for one commitment namespace.
#[derive(Clone, Copy, Debug)]
pub struct CommitmentKeys {
    kind: CommitmentKind,
}

impl CommitmentKeys {
    pub fn new(kind: CommitmentKind) -> Self {
        Self { kind }
    }

    fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let ns = self.kind.namespace().as_bytes();
        let mut key = Vec::with_capacity(ns.len() + 1 + suffix.len());
        key.extend_from_slice(ns);
        key.push(b'/');
        key.extend_from_slice(suffix);
        key
    }

    pub fn buffer(&self) -> Vec<u8> {
        self.key(b"buffer")
    }

    pub fn count(&self) -> Vec<u8> {
        match self.kind {
            CommitmentKind::Checkpoint => self.key(b"ack-count"),
            CommitmentKind::Milestone => self.key(b"count"),
        }
    }

    pub fn confirmed_prefix(&self) -> Vec<u8> {
        self.key(b"confirmed/")
    }

    pub fn confirmed(&self, number: u64) -> Vec<u8> {
        let mut key = self.confirmed_prefix();
        key.extend_from_slice(&number.to_be_bytes());
        key
    }

    pub fn by_id(&self, id_key: &[u8]) -> Vec<u8> {
        let mut key = self.key(b"by-id/");
        key.extend_from_slice(id_key);
        key
    }

    pub fn last_no_ack(&self) -> Vec<u8> {
        self.key(b"last-no-ack")
    }

    pub fn last_no_ack_id(&self) -> Vec<u8> {
        self.key(b"last-no-ack-id")
    }

    pub fn no_ack(&self, id_key: &[u8]) -> Vec<u8> {
        let mut key = self.key(b"no-ack/");
        key.extend_from_slice(id_key);
        key
    }
}
