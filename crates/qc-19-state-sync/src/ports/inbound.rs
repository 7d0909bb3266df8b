//! Driving Ports (API - Inbound)

use crate::domain::{RelaySummary, StreamEventsRequest};
use crate::error::StateSyncResult;
use crate::ports::outbound::PageSink;
use async_trait::async_trait;
use tokio::sync::watch;

/// Event relay API.
#[async_trait]
pub trait StateSyncApi: Send + Sync {
    /// Stream every matching record to `sink`, one page per message, until
    /// upstream is exhausted or `cancel` flips to `true`.
    async fn stream_events(
        &self,
        request: StreamEventsRequest,
        sink: &dyn PageSink,
        cancel: watch::Receiver<bool>,
    ) -> StateSyncResult<RelaySummary>;
}
