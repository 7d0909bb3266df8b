//! Bridge event records
//!
//! An event record is one state-sync log observed on the root chain and
//! accepted by the bridge. Records are identified by a strictly increasing
//! id assigned upstream.

use crate::error::{StateSyncError, StateSyncResult};
use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{serde_as, DeserializeAs, SerializeAs};

/// `0x`-prefixed hex on the wire, raw bytes in memory.
///
/// Fixed-size targets reject input of the wrong length.
pub struct PrefixedHex;

impl<T: AsRef<[u8]>> SerializeAs<T> for PrefixedHex {
    fn serialize_as<S: Serializer>(source: &T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(source.as_ref())))
    }
}

impl<'de, T: TryFrom<Vec<u8>>> DeserializeAs<'de, T> for PrefixedHex {
    fn deserialize_as<D: Deserializer<'de>>(deserializer: D) -> Result<T, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(&text);
        let bytes = hex::decode(digits).map_err(D::Error::custom)?;
        let len = bytes.len();
        T::try_from(bytes)
            .map_err(|_| D::Error::custom(format!("unexpected byte length {len} in {text:?}")))
    }
}

/// One relayed event record, in the upstream JSON shape.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    /// Receiver contract on the sidechain
    #[serde_as(as = "PrefixedHex")]
    pub contract: [u8; 20],
    /// Opaque payload
    #[serde_as(as = "PrefixedHex")]
    pub data: Vec<u8>,
    #[serde_as(as = "PrefixedHex")]
    pub tx_hash: [u8; 32],
    pub log_index: u64,
    pub bor_chain_id: String,
    /// RFC3339 on the wire
    pub record_time: DateTime<Utc>,
}

impl EventRecord {
    /// Record time as unix seconds.
    pub fn record_unix(&self) -> i64 {
        self.record_time.timestamp()
    }
}

/// Decode the `result` member of an upstream page.
///
/// `null` and `[]` both mean "no records".
pub fn decode_records(result: serde_json::Value) -> StateSyncResult<Vec<EventRecord>> {
    serde_json::from_value::<Option<Vec<EventRecord>>>(result)
        .map(Option::unwrap_or_default)
        .map_err(|e| StateSyncError::EncodingError {
            reason: e.to_string(),
        })
}

/// Submission message for a new event record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecordMessage {
    pub proposer: [u8; 20],
    pub id: u64,
    pub tx_hash: [u8; 32],
    pub log_index: u64,
    pub block_number: u64,
    pub contract: [u8; 20],
    pub data: Vec<u8>,
    pub bor_chain_id: String,
}

impl EventRecordMessage {
    pub fn validate(&self) -> StateSyncResult<()> {
        if self.proposer == [0u8; 20] {
            return Err(StateSyncError::invalid("proposer address is empty"));
        }
        if self.tx_hash == [0u8; 32] {
            return Err(StateSyncError::invalid("tx hash is empty"));
        }
        if self.contract == [0u8; 20] {
            return Err(StateSyncError::invalid("contract address is empty"));
        }
        if self.data.is_empty() {
            return Err(StateSyncError::invalid("data is empty"));
        }
        if self.bor_chain_id.trim().is_empty() {
            return Err(StateSyncError::invalid("bor chain id is empty"));
        }
        Ok(())
    }
}
