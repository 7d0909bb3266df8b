//! # State Sync Metrics
//!
//! Enable with the `metrics` feature.
//!
//! - `state_sync_pages_total` - pages delivered to consumers
//! - `state_sync_records_total` - records delivered to consumers
//! - `state_sync_decode_failures_total` - upstream pages that failed to decode
//! - `state_sync_streams_total{termination}` - finished relays

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref PAGES_RELAYED: IntCounter = register_int_counter!(
        "state_sync_pages_total",
        "Total number of event pages delivered"
    )
    .expect("Failed to create PAGES_RELAYED metric");

    pub static ref RECORDS_RELAYED: IntCounter = register_int_counter!(
        "state_sync_records_total",
        "Total number of event records delivered"
    )
    .expect("Failed to create RECORDS_RELAYED metric");

    pub static ref DECODE_FAILURES: IntCounter = register_int_counter!(
        "state_sync_decode_failures_total",
        "Upstream pages that could not be decoded"
    )
    .expect("Failed to create DECODE_FAILURES metric");

    pub static ref STREAMS_FINISHED: IntCounterVec = register_int_counter_vec!(
        "state_sync_streams_total",
        "Finished relay streams by termination",
        &["termination"]
    )
    .expect("Failed to create STREAMS_FINISHED metric");
}

#[cfg(feature = "metrics")]
pub fn record_page(records: usize) {
    PAGES_RELAYED.inc();
    RECORDS_RELAYED.inc_by(records as u64);
}

#[cfg(feature = "metrics")]
pub fn record_decode_failure() {
    DECODE_FAILURES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_stream_end(termination: &str) {
    STREAMS_FINISHED.with_label_values(&[termination]).inc();
}

#[cfg(not(feature = "metrics"))]
pub fn record_page(_records: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_decode_failure() {}

#[cfg(not(feature = "metrics"))]
pub fn record_stream_end(_termination: &str) {}
