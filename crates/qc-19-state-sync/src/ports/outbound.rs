//! Driven Ports (SPI - Outbound)
//!
//! The relay depends on two collaborators it does not own: the upstream
//! bridge API that serves event records page by page, and the transport that
//! carries pages to the consumer.

use crate::domain::EventPage;
use crate::error::StateSyncResult;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

/// Raw upstream page: `{"height": "<n>", "result": [...]}`.
///
/// `result` stays undecoded; the relay owns the decode policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpstreamPage {
    #[serde(deserialize_with = "height_string")]
    pub height: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

fn height_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Height {
        Text(String),
        Number(u64),
    }

    Ok(match Height::deserialize(deserializer)? {
        Height::Text(s) => s,
        Height::Number(n) => n.to_string(),
    })
}

/// Bridge event fetcher - outbound port.
#[async_trait]
pub trait EventRecordFetcher: Send + Sync {
    /// One page of records with `id > from_id` and `record_time <= to_time`,
    /// ascending by id, at most `limit` long.
    async fn fetch(&self, from_id: u64, to_time: u64, limit: u64) -> StateSyncResult<UpstreamPage>;
}

#[async_trait]
impl<T: EventRecordFetcher + ?Sized> EventRecordFetcher for Arc<T> {
    async fn fetch(&self, from_id: u64, to_time: u64, limit: u64) -> StateSyncResult<UpstreamPage> {
        (**self).fetch(from_id, to_time, limit).await
    }
}

/// Stream transport - outbound port.
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Deliver one page. Fails with `TransportClosed` once the consumer is gone.
    async fn send(&self, page: EventPage) -> StateSyncResult<()>;

    /// Whether the consumer has already gone away.
    fn is_closed(&self) -> bool {
        false
    }

    /// Resolves when the consumer goes away. Never resolves for sinks that
    /// cannot observe their consumer.
    async fn closed(&self) {
        std::future::pending::<()>().await
    }
}
