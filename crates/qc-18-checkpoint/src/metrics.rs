//! # Checkpoint Metrics
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-checkpoint = { path = "...", features = ["metrics"] }
//! ```
//!
//! - `checkpoint_confirmed_total{kind}` - commitments confirmed
//! - `checkpoint_no_ack_total{kind,reason}` - commitments no-ACK'd
//! - `checkpoint_count{kind}` - AckCount / MilestoneCount
//! - `checkpoint_buffered{kind}` - 1 while a commitment is buffered

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_gauge_vec, register_int_counter_vec, GaugeVec, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref COMMITMENTS_CONFIRMED: IntCounterVec = register_int_counter_vec!(
        "checkpoint_confirmed_total",
        "Total number of commitments confirmed",
        &["kind"]
    )
    .expect("Failed to create COMMITMENTS_CONFIRMED metric");

    pub static ref COMMITMENTS_NO_ACKED: IntCounterVec = register_int_counter_vec!(
        "checkpoint_no_ack_total",
        "Total number of commitments that were not acknowledged",
        &["kind", "reason"]
    )
    .expect("Failed to create COMMITMENTS_NO_ACKED metric");

    pub static ref COMMITMENT_COUNT: GaugeVec = register_gauge_vec!(
        "checkpoint_count",
        "Number of confirmed commitments",
        &["kind"]
    )
    .expect("Failed to create COMMITMENT_COUNT metric");

    pub static ref COMMITMENT_BUFFERED: GaugeVec = register_gauge_vec!(
        "checkpoint_buffered",
        "Whether a commitment is currently buffered (0=no, 1=yes)",
        &["kind"]
    )
    .expect("Failed to create COMMITMENT_BUFFERED metric");
}

#[cfg(feature = "metrics")]
pub fn record_confirmed(kind: &str, count: u64) {
    COMMITMENTS_CONFIRMED.with_label_values(&[kind]).inc();
    COMMITMENT_COUNT.with_label_values(&[kind]).set(count as f64);
}

#[cfg(feature = "metrics")]
pub fn record_no_ack(kind: &str, expired: bool) {
    let reason = if expired { "expired" } else { "rejected" };
    COMMITMENTS_NO_ACKED.with_label_values(&[kind, reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn set_buffered(kind: &str, buffered: bool) {
    COMMITMENT_BUFFERED
        .with_label_values(&[kind])
        .set(if buffered { 1.0 } else { 0.0 });
}

#[cfg(not(feature = "metrics"))]
pub fn record_confirmed(_kind: &str, _count: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn record_no_ack(_kind: &str, _expired: bool) {}

#[cfg(not(feature = "metrics"))]
pub fn set_buffered(_kind: &str, _buffered: bool) {}
