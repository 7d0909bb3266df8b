//! State Sync Service - the event relay loop
//!
//! ```text
//! cursor = from_id
//! loop:
//!     cancelled?            → stop (Cancelled)
//!     consumer gone?        → stop (TransportClosed)
//!     page = fetch(cursor)  → empty? stop (CaughtUp)
//!     send(page)
//!     cursor = advance(cursor, page)
//! ```
//!
//! Fetch and send are the only suspension points and both race the
//! cancellation signal and the consumer disconnecting. Nothing is retried here; the consumer reconnects with
//! the last id it saw.

use crate::domain::{
    decode_records, CursorAdvance, EventPage, RelayCursor, RelaySummary, StreamEventsRequest,
    Termination,
};
use crate::error::{StateSyncError, StateSyncResult};
use crate::metrics;
use crate::ports::inbound::StateSyncApi;
use crate::ports::outbound::{EventRecordFetcher, PageSink};
use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Upstream API never serves more than this many records per page.
pub const DEFAULT_MAX_PAGE_LIMIT: u64 = 1000;

/// State sync configuration
#[derive(Clone, Debug)]
pub struct StateSyncConfig {
    /// Requests above this limit are clamped
    pub max_page_limit: u64,
    pub advance: CursorAdvance,
}

impl Default for StateSyncConfig {
    fn default() -> Self {
        Self {
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
            advance: CursorAdvance::ByLimit,
        }
    }
}

/// Resolves once `cancel` holds `true`. A dropped sender never cancels.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn consumer_gone(position: u64) -> StateSyncError {
    info!("[qc-19] consumer went away at from-id {}", position);
    metrics::record_stream_end("transport_closed");
    StateSyncError::TransportClosed
}

pub struct StateSyncService<F> {
    config: StateSyncConfig,
    fetcher: F,
}

impl<F: EventRecordFetcher> StateSyncService<F> {
    pub fn new(config: StateSyncConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &StateSyncConfig {
        &self.config
    }

    fn effective_limit(&self, requested: u64) -> StateSyncResult<u64> {
        if requested == 0 {
            return Err(StateSyncError::invalid("limit must be positive"));
        }
        if requested > self.config.max_page_limit {
            info!(
                "[qc-19] limit {} clamped to {}",
                requested, self.config.max_page_limit
            );
            return Ok(self.config.max_page_limit);
        }
        Ok(requested)
    }

    /// Relay every matching record to `sink`.
    pub async fn relay(
        &self,
        request: StreamEventsRequest,
        sink: &dyn PageSink,
        mut cancel: watch::Receiver<bool>,
    ) -> StateSyncResult<RelaySummary> {
        let limit = self.effective_limit(request.limit)?;
        let mut cursor = RelayCursor::new(request.from_id, limit, self.config.advance);
        let mut summary = RelaySummary::starting_at(request.from_id);

        debug!(
            "[qc-19] relay from-id={} to-time={} limit={} advance={}",
            request.from_id, request.to_time, limit, self.config.advance
        );

        loop {
            if *cancel.borrow() {
                summary.termination = Termination::Cancelled;
                break;
            }
            if sink.is_closed() {
                return Err(consumer_gone(cursor.position()));
            }

            let upstream = tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    summary.termination = Termination::Cancelled;
                    break;
                }
                _ = sink.closed() => return Err(consumer_gone(cursor.position())),
                page = self.fetcher.fetch(cursor.position(), request.to_time, limit) => page?,
            };

            let records = match decode_records(upstream.result) {
                Ok(records) => records,
                Err(e) => {
                    warn!(
                        "[qc-19] undecodable event page at from-id {}: {}",
                        cursor.position(),
                        e
                    );
                    summary.decode_failures += 1;
                    metrics::record_decode_failure();
                    Vec::new()
                }
            };

            if records.is_empty() {
                summary.termination = Termination::CaughtUp;
                break;
            }

            let next = cursor.next_after(&records);
            let count = records.len();
            let page = EventPage {
                height: upstream.height,
                records,
            };

            tokio::select! {
                biased;
                _ = cancelled(&mut cancel) => {
                    summary.termination = Termination::Cancelled;
                    break;
                }
                _ = sink.closed() => return Err(consumer_gone(cursor.position())),
                sent = sink.send(page) => sent?,
            }

            cursor.advance_to(next);
            summary.pages_sent += 1;
            summary.records_sent += count as u64;
            summary.next_from_id = cursor.position();
            metrics::record_page(count);
        }

        info!(
            "[qc-19] relay finished ({}): {} pages, {} records, next from-id {}",
            summary.termination.as_str(),
            summary.pages_sent,
            summary.records_sent,
            summary.next_from_id
        );
        metrics::record_stream_end(summary.termination.as_str());
        Ok(summary)
    }
}

#[async_trait]
impl<F: EventRecordFetcher> StateSyncApi for StateSyncService<F> {
    async fn stream_events(
        &self,
        request: StreamEventsRequest,
        sink: &dyn PageSink,
        cancel: watch::Receiver<bool>,
    ) -> StateSyncResult<RelaySummary> {
        self.relay(request, sink, cancel).await
    }
}
