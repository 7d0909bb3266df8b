//! State-sync subscription handler (qc-19)
//!
//! Each [`StreamSubscription`] gets its own relay task. Node shutdown is the
//! cancellation signal for every stream still open.

use std::sync::Arc;

use qc_19_state_sync::{
    ChannelPageSink, EventPage, EventRecordFetcher, RelaySummary, StateSyncResult,
    StateSyncService, StreamEventsRequest,
};
use quantum_telemetry::subsystem_span;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn, Instrument};

use super::HandlerError;

/// A consumer asking for a stream of event pages.
pub struct StreamSubscription {
    pub request: StreamEventsRequest,
    /// Pages are delivered here in order
    pub pages: mpsc::Sender<EventPage>,
    /// Relay outcome, sent once the stream ends
    pub done: oneshot::Sender<StateSyncResult<RelaySummary>>,
}

/// Handler for state-sync subscriptions.
pub struct StateSyncHandler<F> {
    receiver: mpsc::Receiver<StreamSubscription>,
    service: Arc<StateSyncService<F>>,
    shutdown: watch::Receiver<bool>,
}

impl<F: EventRecordFetcher + 'static> StateSyncHandler<F> {
    pub fn new(
        receiver: mpsc::Receiver<StreamSubscription>,
        service: Arc<StateSyncService<F>>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            receiver,
            service,
            shutdown,
        }
    }

    /// Accept subscriptions until shutdown or until every sender is dropped.
    pub async fn run(mut self) {
        info!("[qc-19] State-sync handler started");

        loop {
            if *self.shutdown.borrow() {
                break;
            }
            tokio::select! {
                sub = self.receiver.recv() => match sub {
                    Some(sub) => self.spawn_relay(sub),
                    None => {
                        info!("[qc-19] Subscription channel closed, exiting");
                        return;
                    }
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("[qc-19] Shutdown signalled, no new streams accepted");
    }

    fn spawn_relay(&self, sub: StreamSubscription) {
        let service = Arc::clone(&self.service);
        let cancel = self.shutdown.clone();
        let StreamSubscription {
            request,
            pages,
            done,
        } = sub;

        debug!("[qc-19] new stream from-id={}", request.from_id);

        let span = subsystem_span!("relay", subsystem = "qc-19", from_id = request.from_id);

        tokio::spawn(
            async move {
                let sink = ChannelPageSink::new(pages);
                let result = service.relay(request, &sink, cancel).await;

                if let Err(e) = &result {
                    warn!("[qc-19] stream from-id={} failed: {}", request.from_id, e);
                }
                if done.send(result).is_err() {
                    debug!("[qc-19] stream owner went away before completion");
                }
            }
            .instrument(span),
        );
    }
}

/// Open streams against the running handler.
#[derive(Clone)]
pub struct StateSyncClient {
    sender: mpsc::Sender<StreamSubscription>,
    page_buffer: usize,
}

/// Receiving ends of one open stream.
pub struct EventStream {
    pub pages: mpsc::Receiver<EventPage>,
    pub done: oneshot::Receiver<StateSyncResult<RelaySummary>>,
}

impl EventStream {
    /// Drain every page, then return the relay outcome.
    pub async fn collect(mut self) -> Result<(Vec<EventPage>, RelaySummary), HandlerError> {
        let mut pages = Vec::new();
        while let Some(page) = self.pages.recv().await {
            pages.push(page);
        }
        let summary = self.done.await.map_err(|_| HandlerError::Closed)??;
        Ok((pages, summary))
    }
}

impl StateSyncClient {
    pub fn new(sender: mpsc::Sender<StreamSubscription>, page_buffer: usize) -> Self {
        Self {
            sender,
            page_buffer: page_buffer.max(1),
        }
    }

    pub async fn subscribe(&self, request: StreamEventsRequest) -> Result<EventStream, HandlerError> {
        let (pages_tx, pages) = mpsc::channel(self.page_buffer);
        let (done_tx, done) = oneshot::channel();
        self.sender
            .send(StreamSubscription {
                request,
                pages: pages_tx,
                done: done_tx,
            })
            .await
            .map_err(|_| HandlerError::Closed)?;
        Ok(EventStream { pages, done })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use qc_19_state_sync::{StateSyncConfig, Termination, UpstreamPage};
    use serde_json::json;

    /// Serves ids `1..=total`, optionally stalling once the cursor reaches `stall_at`.
    struct RangeFetcher {
        total: u64,
        stall_at: Option<u64>,
    }

    #[async_trait]
    impl EventRecordFetcher for RangeFetcher {
        async fn fetch(
            &self,
            from_id: u64,
            _to_time: u64,
            limit: u64,
        ) -> StateSyncResult<UpstreamPage> {
            if self.stall_at.is_some_and(|at| from_id >= at) {
                std::future::pending::<()>().await;
            }
            let records: Vec<_> = (from_id + 1..=self.total)
                .take(limit as usize)
                .map(|id| {
                    json!({
                        "id": id,
                        "contract": format!("0x{:040x}", 0x10f0),
                        "data": "0x00",
                        "tx_hash": format!("0x{id:064x}"),
                        "log_index": 0, "bor_chain_id": "137",
                        "record_time": "2024-03-01T12:00:00Z"
                    })
                })
                .collect();
            Ok(UpstreamPage {
                height: "42".into(),
                result: json!(records),
            })
        }
    }

    fn spawn_handler(fetcher: RangeFetcher) -> (StateSyncClient, watch::Sender<bool>) {
        let service = Arc::new(StateSyncService::new(StateSyncConfig::default(), fetcher));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (tx, rx) = mpsc::channel(4);
        tokio::spawn(StateSyncHandler::new(rx, service, shutdown_rx).run());
        (StateSyncClient::new(tx, 4), shutdown_tx)
    }

    fn request(from_id: u64, limit: u64) -> StreamEventsRequest {
        StreamEventsRequest {
            from_id,
            to_time: u64::MAX,
            limit,
        }
    }

    #[tokio::test]
    async fn test_stream_delivers_all_pages() {
        let (client, _shutdown) = spawn_handler(RangeFetcher {
            total: 25,
            stall_at: None,
        });

        let (pages, summary) = client
            .subscribe(request(0, 10))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap();

        let sizes: Vec<_> = pages.iter().map(EventPage::len).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
        assert_eq!(summary.records_sent, 25);
        assert_eq!(summary.termination, Termination::CaughtUp);
    }

    #[tokio::test]
    async fn test_streams_run_concurrently() {
        let (client, _shutdown) = spawn_handler(RangeFetcher {
            total: 6,
            stall_at: None,
        });

        let a = client.subscribe(request(0, 2)).await.unwrap();
        let b = client.subscribe(request(3, 2)).await.unwrap();

        let (_, a) = a.collect().await.unwrap();
        let (_, b) = b.collect().await.unwrap();
        assert_eq!(a.records_sent, 6);
        assert_eq!(b.records_sent, 3);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_open_stream() {
        let (client, shutdown) = spawn_handler(RangeFetcher {
            total: 100,
            stall_at: Some(10),
        });

        let mut stream = client.subscribe(request(0, 10)).await.unwrap();
        let first = stream.pages.recv().await.unwrap();
        assert_eq!(first.len(), 10);

        shutdown.send(true).unwrap();

        let (rest, summary) = stream.collect().await.unwrap();
        assert!(rest.is_empty());
        assert_eq!(summary.termination, Termination::Cancelled);
        assert_eq!(summary.next_from_id, 10);
    }

    #[tokio::test]
    async fn test_invalid_request_reported() {
        let (client, _shutdown) = spawn_handler(RangeFetcher {
            total: 1,
            stall_at: None,
        });

        let err = client
            .subscribe(request(0, 0))
            .await
            .unwrap()
            .collect()
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::StateSync(_)));
    }
}
