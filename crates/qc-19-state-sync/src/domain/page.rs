//! Relay request, pages and summary

use super::event_record::EventRecord;
use serde::{Deserialize, Serialize};

/// Long-lived streaming request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEventsRequest {
    /// Stream records with id strictly greater than this
    pub from_id: u64,
    /// Only records with `record_time <= to_time` (unix seconds)
    pub to_time: u64,
    /// Page size requested upstream
    pub limit: u64,
}

/// One message on the stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPage {
    /// Upstream height the page was read at
    pub height: String,
    pub records: Vec<EventRecord>,
}

impl EventPage {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Upstream returned an empty page
    #[default]
    CaughtUp,
    Cancelled,
}

impl Termination {
    pub fn as_str(&self) -> &'static str {
        match self {
            Termination::CaughtUp => "caught_up",
            Termination::Cancelled => "cancelled",
        }
    }
}

/// What a finished relay did. `next_from_id` is the resume watermark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelaySummary {
    pub pages_sent: u64,
    pub records_sent: u64,
    pub next_from_id: u64,
    pub decode_failures: u64,
    pub termination: Termination,
}

impl RelaySummary {
    pub fn starting_at(from_id: u64) -> Self {
        Self {
            next_from_id: from_id,
            ..Self::default()
        }
    }
}
