//! Channel-backed page sink
//!
//! Bounded tokio mpsc; backpressure from a slow consumer suspends the relay
//! in `send`.

use crate::domain::EventPage;
use crate::error::{StateSyncError, StateSyncResult};
use crate::ports::outbound::PageSink;
use async_trait::async_trait;
use tokio::sync::mpsc;

#[derive(Clone)]
pub struct ChannelPageSink {
    tx: mpsc::Sender<EventPage>,
}

impl ChannelPageSink {
    pub fn new(tx: mpsc::Sender<EventPage>) -> Self {
        Self { tx }
    }

    /// A sink plus the receiving half for the consumer.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<EventPage>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl PageSink for ChannelPageSink {
    async fn send(&self, page: EventPage) -> StateSyncResult<()> {
        self.tx
            .send(page)
            .await
            .map_err(|_| StateSyncError::TransportClosed)
    }

    fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn closed(&self) {
        self.tx.closed().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> EventPage {
        EventPage {
            height: "1".into(),
            records: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_delivers_pages() {
        let (sink, mut rx) = ChannelPageSink::channel(4);
        sink.send(page()).await.unwrap();
        assert_eq!(rx.recv().await, Some(page()));
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_transport_closed() {
        let (sink, rx) = ChannelPageSink::channel(1);
        drop(rx);
        assert!(matches!(
            sink.send(page()).await,
            Err(StateSyncError::TransportClosed)
        ));
    }

    #[tokio::test]
    async fn test_closed_follows_receiver() {
        let (sink, rx) = ChannelPageSink::channel(1);
        assert!(!sink.is_closed());

        drop(rx);
        assert!(sink.is_closed());
        tokio::time::timeout(std::time::Duration::from_secs(1), sink.closed())
            .await
            .unwrap();
    }
}
