//! Domain module for the State Sync relay
//!
//! - event_record: relayed records and submission validation
//! - cursor: resume watermark and advance policy
//! - page: request, stream message and summary

pub mod cursor;
pub mod event_record;
pub mod page;

pub use cursor::{CursorAdvance, RelayCursor};
pub use event_record::{decode_records, EventRecord, EventRecordMessage, PrefixedHex};
pub use page::{EventPage, RelaySummary, StreamEventsRequest, Termination};
