//! # qc-19-state-sync
//!
//! State Sync Relay: streams bridge event records from the upstream API to
//! sidechain consumers as an ordered, resumable sequence of pages.
//!
//! ## Overview
//!
//! - **Cursor relay**: fetch, forward, advance until an empty page
//! - **Advance policies**: by `limit` (upstream contract) or by last id
//! - **Cancellation**: a `watch` signal raced against every fetch and send
//! - **Resume**: reconnect with the last id seen; no gap, no overlap
//!
//! ## Architecture
//!
//! ```text
//! Bridge REST API ──UpstreamPage──→ StateSyncService ──EventPage──→ PageSink ──→ consumer
//!      (HttpEventRecordFetcher)            │
//!                                          └── RelaySummary (resume watermark)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use qc_19_state_sync::{ChannelPageSink, HttpEventRecordFetcher, StateSyncConfig, StateSyncService};
//!
//! let fetcher = HttpEventRecordFetcher::new("http://localhost:1317", Duration::from_secs(10))?;
//! let service = StateSyncService::new(StateSyncConfig::default(), fetcher);
//! let (sink, mut pages) = ChannelPageSink::channel(16);
//!
//! let summary = service.relay(request, &sink, shutdown_rx).await?;
//! ```

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use adapters::{ChannelPageSink, HttpEventRecordFetcher};
pub use domain::{
    CursorAdvance, EventPage, EventRecord, EventRecordMessage, PrefixedHex, RelayCursor,
    RelaySummary, StreamEventsRequest, Termination,
};
pub use error::{StateSyncError, StateSyncResult};
pub use ports::{EventRecordFetcher, PageSink, StateSyncApi, UpstreamPage};
pub use service::{StateSyncConfig, StateSyncService, DEFAULT_MAX_PAGE_LIMIT};
