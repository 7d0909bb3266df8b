//! Commitment Store
//!
//! Typed view over one commitment namespace of the shared state accessor.
//! The same type serves checkpoints and milestones; what differs between them
//! is encoded in the [`Commitment`] trait.
//!
//! Reads take the accessor's read lock and only ever see committed state.
//! Every mutation is built as a list of [`BatchOperation`]s first, so the
//! state machine can fold the checkpoint and milestone transitions of one
//! commit boundary into a single atomic write.

use crate::domain::{Commitment, CommitmentKeys};
use crate::error::{CheckpointError, CheckpointResult};
use crate::ports::outbound::{BatchOperation, KeyValueStore};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Shared handle to the state accessor.
pub type SharedStore<S> = Arc<RwLock<S>>;

pub struct CommitmentStore<C, S> {
    kv: SharedStore<S>,
    keys: CommitmentKeys,
    _commitment: PhantomData<fn() -> C>,
}

impl<C, S> Clone for CommitmentStore<C, S> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            keys: self.keys,
            _commitment: PhantomData,
        }
    }
}

fn encode<T: Serialize>(key: &[u8], value: &T) -> CheckpointResult<Vec<u8>> {
    bincode::serialize(value).map_err(|e| CheckpointError::EncodingError {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(key: &[u8], bytes: &[u8]) -> CheckpointResult<T> {
    bincode::deserialize(bytes).map_err(|e| CheckpointError::EncodingError {
        key: String::from_utf8_lossy(key).into_owned(),
        reason: e.to_string(),
    })
}

fn read<T: DeserializeOwned, S: KeyValueStore>(kv: &S, key: &[u8]) -> CheckpointResult<Option<T>> {
    match kv.get(key)? {
        Some(bytes) => decode(key, &bytes).map(Some),
        None => Ok(None),
    }
}

impl<C: Commitment, S: KeyValueStore> CommitmentStore<C, S> {
    pub fn new(kv: SharedStore<S>) -> Self {
        Self {
            kv,
            keys: CommitmentKeys::new(C::KIND),
            _commitment: PhantomData,
        }
    }

    pub fn shared(&self) -> &SharedStore<S> {
        &self.kv
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// The pending commitment, if one is buffered.
    pub fn buffered(&self) -> CheckpointResult<Option<C>> {
        self.buffered_in(&*self.kv.read())
    }

    /// Number of confirmed commitments (AckCount / MilestoneCount).
    pub fn count(&self) -> CheckpointResult<u64> {
        self.count_in(&*self.kv.read())
    }

    /// Confirmed commitment at position `number` (1-based).
    pub fn confirmed(&self, number: u64) -> CheckpointResult<Option<C>> {
        self.confirmed_in(&*self.kv.read(), number)
    }

    pub fn latest_confirmed(&self) -> CheckpointResult<Option<C>> {
        let kv = self.kv.read();
        match self.count_in(&*kv)? {
            0 => Ok(None),
            n => self.confirmed_in(&*kv, n),
        }
    }

    /// Number assigned to a confirmed commitment, looked up by id.
    pub fn number_of(&self, id: &C::Id) -> CheckpointResult<Option<u64>> {
        let kv = self.kv.read();
        if C::CONTENT_ADDRESSED {
            return read(&*kv, &self.keys.by_id(&C::id_key(id)));
        }
        let count = self.count_in(&*kv)?;
        Ok(C::number_for_id(id).filter(|n| (1..=count).contains(n)))
    }

    /// Confirmed commitment whose block range contains `height`.
    ///
    /// Confirmed ranges are ordered by block height, so this is a binary
    /// search over the contiguous index.
    pub fn confirmed_containing(&self, height: u64) -> CheckpointResult<Option<C>> {
        let kv = self.kv.read();
        let (mut lo, mut hi) = (1u64, self.count_in(&*kv)?);
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let Some(candidate) = self.confirmed_in(&*kv, mid)? else {
                return Err(CheckpointError::StateInvariantViolation {
                    reason: format!("{} {} missing from confirmed index", C::KIND, mid),
                });
            };
            let header = candidate.header();
            if header.contains(height) {
                return Ok(Some(candidate));
            }
            if height < header.start_block {
                hi = mid - 1;
            } else {
                lo = mid + 1;
            }
        }
        Ok(None)
    }

    /// Time of the most recent no-ACK of this kind.
    pub fn last_no_ack_time(&self) -> CheckpointResult<Option<u64>> {
        read(&*self.kv.read(), &self.keys.last_no_ack())
    }

    /// Id of the most recently no-ACK'd commitment (content-addressed kinds).
    pub fn last_no_ack_id(&self) -> CheckpointResult<Option<C::Id>> {
        read(&*self.kv.read(), &self.keys.last_no_ack_id())
    }

    /// No-ACK time recorded for a specific commitment id.
    pub fn no_ack_time(&self, id: &C::Id) -> CheckpointResult<Option<u64>> {
        read(&*self.kv.read(), &self.keys.no_ack(&C::id_key(id)))
    }

    pub(crate) fn buffered_in(&self, kv: &S) -> CheckpointResult<Option<C>> {
        read(kv, &self.keys.buffer())
    }

    pub(crate) fn count_in(&self, kv: &S) -> CheckpointResult<u64> {
        Ok(read(kv, &self.keys.count())?.unwrap_or(0))
    }

    pub(crate) fn confirmed_in(&self, kv: &S, number: u64) -> CheckpointResult<Option<C>> {
        if number == 0 {
            return Ok(None);
        }
        read(kv, &self.keys.confirmed(number))
    }

    // -------------------------------------------------------------------------
    // Planned mutations
    // -------------------------------------------------------------------------

    pub(crate) fn set_buffered_ops(&self, commitment: &C) -> CheckpointResult<Vec<BatchOperation>> {
        let key = self.keys.buffer();
        let value = encode(&key, commitment)?;
        Ok(vec![BatchOperation::put(key, value)])
    }

    pub(crate) fn clear_buffered_ops(&self) -> Vec<BatchOperation> {
        vec![BatchOperation::delete(self.keys.buffer())]
    }

    /// Plan a confirmation. Nothing is written if this returns `Err`.
    pub(crate) fn confirm_ops(
        &self,
        kv: &S,
        commitment: &C,
    ) -> CheckpointResult<(u64, Vec<BatchOperation>)> {
        let count = self.count_in(kv)?;
        let id = commitment.id();

        let number = match commitment.claimed_number() {
            Some(n) if n <= count => {
                return Err(CheckpointError::AlreadyConfirmed {
                    kind: C::KIND.as_str(),
                    id: id.to_string(),
                })
            }
            Some(n) if n != count + 1 => {
                return Err(CheckpointError::StateInvariantViolation {
                    reason: format!(
                        "{} {} confirmed out of order, next expected is {}",
                        C::KIND,
                        n,
                        count + 1
                    ),
                })
            }
            Some(n) => n,
            None => count.checked_add(1).ok_or_else(|| {
                CheckpointError::StateInvariantViolation {
                    reason: format!("{} count overflow", C::KIND),
                }
            })?,
        };

        let mut ops = Vec::with_capacity(4);
        if C::CONTENT_ADDRESSED {
            let by_id = self.keys.by_id(&C::id_key(&id));
            if kv.exists(&by_id)? {
                return Err(CheckpointError::AlreadyConfirmed {
                    kind: C::KIND.as_str(),
                    id: id.to_string(),
                });
            }
            ops.push(BatchOperation::put(by_id.clone(), encode(&by_id, &number)?));
        }

        let confirmed_key = self.keys.confirmed(number);
        ops.push(BatchOperation::put(
            confirmed_key.clone(),
            encode(&confirmed_key, commitment)?,
        ));
        let count_key = self.keys.count();
        ops.push(BatchOperation::put(count_key.clone(), encode(&count_key, &number)?));
        ops.extend(self.clear_buffered_ops());

        Ok((number, ops))
    }

    /// Plan a no-ACK record. Always clears the buffer.
    pub(crate) fn no_ack_ops(&self, id: &C::Id, timestamp: u64) -> CheckpointResult<Vec<BatchOperation>> {
        let mut ops = Vec::with_capacity(4);
        let last = self.keys.last_no_ack();
        ops.push(BatchOperation::put(last.clone(), encode(&last, &timestamp)?));

        if C::CONTENT_ADDRESSED {
            let per_id = self.keys.no_ack(&C::id_key(id));
            ops.push(BatchOperation::put(per_id.clone(), encode(&per_id, &timestamp)?));
            let pointer = self.keys.last_no_ack_id();
            ops.push(BatchOperation::put(pointer.clone(), encode(&pointer, id)?));
        }

        ops.extend(self.clear_buffered_ops());
        Ok(ops)
    }

    // -------------------------------------------------------------------------
    // Direct mutations
    // -------------------------------------------------------------------------

    /// Buffer a commitment, silently replacing any pending one.
    pub fn set_buffered(&self, commitment: &C) -> CheckpointResult<()> {
        let ops = self.set_buffered_ops(commitment)?;
        self.kv.write().atomic_batch_write(ops)?;
        Ok(())
    }

    pub fn clear_buffered(&self) -> CheckpointResult<()> {
        self.kv.write().atomic_batch_write(self.clear_buffered_ops())?;
        Ok(())
    }

    /// Append to the confirmed index, bump the count by one and clear the
    /// buffer. Returns the number assigned.
    pub fn confirm(&self, commitment: &C) -> CheckpointResult<u64> {
        let mut kv = self.kv.write();
        let (number, ops) = self.confirm_ops(&*kv, commitment)?;
        kv.atomic_batch_write(ops)?;
        Ok(number)
    }

    /// Record a no-ACK at `timestamp` and clear the buffer.
    pub fn record_no_ack(&self, id: &C::Id, timestamp: u64) -> CheckpointResult<()> {
        let ops = self.no_ack_ops(id, timestamp)?;
        self.kv.write().atomic_batch_write(ops)?;
        Ok(())
    }
}
