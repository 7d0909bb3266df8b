//! # State-Sync Integration Flows
//!
//! Streams driven through the runtime's state-sync handler, over real HTTP
//! against the in-process bridge stub.
//!
//! ```text
//! StateSyncClient ──subscribe──→ StateSyncHandler ──→ relay ──HTTP──→ BridgeStub
//!        ↑                                               │
//!        └─────────────── pages (mpsc) ──────────────────┘
//! ```

use std::time::Duration;

use node_runtime::{HandlerError, NodeConfig, NodeRuntime, SubsystemContainer};
use qc_18_checkpoint::InMemoryKVStore;
use qc_19_state_sync::{
    CursorAdvance, EventPage, HttpEventRecordFetcher, StateSyncError, StreamEventsRequest,
    Termination,
};

use super::bridge_stub::{BridgeStub, PageRequest, BASE_TIME};

type Runtime = NodeRuntime<InMemoryKVStore, HttpEventRecordFetcher>;

fn start_runtime(base_url: &str, advance: CursorAdvance) -> Runtime {
    let mut config = NodeConfig::default();
    config.state_sync.bridge_endpoint = base_url.to_string();
    config.state_sync.advance = advance;

    let fetcher =
        HttpEventRecordFetcher::new(base_url, Duration::from_secs(5)).expect("valid endpoint");
    let mut runtime = NodeRuntime::new(SubsystemContainer::with_backends(
        config,
        InMemoryKVStore::new(),
        fetcher,
    ));
    runtime.start();
    runtime
}

fn request(from_id: u64, to_time: u64, limit: u64) -> StreamEventsRequest {
    StreamEventsRequest {
        from_id,
        to_time,
        limit,
    }
}

fn ids(pages: &[EventPage]) -> Vec<u64> {
    pages
        .iter()
        .flat_map(|p| p.records.iter().map(|r| r.id))
        .collect()
}

#[tokio::test]
async fn test_stream_pages_through_bridge() {
    let stub = BridgeStub::spawn(1..=250).await;
    let runtime = start_runtime(&stub.base_url, CursorAdvance::ByLimit);

    let (pages, summary) = runtime
        .state_sync_client()
        .subscribe(request(0, u64::MAX, 100))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let sizes: Vec<_> = pages.iter().map(EventPage::len).collect();
    assert_eq!(sizes, vec![100, 100, 50]);
    assert_eq!(ids(&pages), (1..=250).collect::<Vec<_>>());
    assert!(pages.iter().all(|p| p.height == "4096"));
    assert_eq!(summary.termination, Termination::CaughtUp);

    // Cursor advances by the limit, so the final empty fetch starts at 300
    let from_ids: Vec<_> = stub.requests().iter().map(|r| r.from_id).collect();
    assert_eq!(from_ids, vec![0, 100, 200, 300]);
    assert_eq!(summary.next_from_id, 300);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_resume_from_last_seen_id() {
    let stub = BridgeStub::spawn(1..=250).await;
    let runtime = start_runtime(&stub.base_url, CursorAdvance::ByLimit);
    let client = runtime.state_sync_client();

    // First connection only sees records up to id 120
    let (first, _) = client
        .subscribe(request(0, BASE_TIME + 120, 50))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    let last_seen = *ids(&first).last().unwrap();
    assert_eq!(last_seen, 120);

    let (second, _) = client
        .subscribe(request(last_seen, u64::MAX, 50))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    let mut all = ids(&first);
    all.extend(ids(&second));
    assert_eq!(all, (1..=250).collect::<Vec<_>>());

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_time_bound_respected() {
    let stub = BridgeStub::spawn(1..=30).await;
    let runtime = start_runtime(&stub.base_url, CursorAdvance::ByLimit);

    let (pages, _) = runtime
        .state_sync_client()
        .subscribe(request(0, BASE_TIME + 17, 5))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(ids(&pages), (1..=17).collect::<Vec<_>>());
    assert!(stub
        .requests()
        .iter()
        .all(|r| r.to_time == BASE_TIME + 17 && r.limit == 5));

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_sparse_ids_by_last_id() {
    let stub = BridgeStub::spawn((2..=40).step_by(2)).await;
    let runtime = start_runtime(&stub.base_url, CursorAdvance::ByLastId);

    let (pages, summary) = runtime
        .state_sync_client()
        .subscribe(request(0, u64::MAX, 5))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(ids(&pages), (2..=40).step_by(2).collect::<Vec<_>>());
    assert_eq!(summary.next_from_id, 40);

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_capped_upstream_by_last_id_loses_nothing() {
    // Upstream serves at most 3 records whatever the requested limit
    let stub = BridgeStub::spawn_with(1..=20, 3, None).await;
    let runtime = start_runtime(&stub.base_url, CursorAdvance::ByLastId);

    let (pages, _) = runtime
        .state_sync_client()
        .subscribe(request(0, u64::MAX, 10))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(ids(&pages), (1..=20).collect::<Vec<_>>());
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_limit_clamped_upstream() {
    let stub = BridgeStub::spawn(1..=3).await;
    let runtime = start_runtime(&stub.base_url, CursorAdvance::ByLimit);

    runtime
        .state_sync_client()
        .subscribe(request(0, u64::MAX, 50_000))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(
        stub.requests()[0],
        PageRequest {
            from_id: 0,
            to_time: u64::MAX,
            limit: 1000
        }
    );
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_cancels_open_stream() {
    let stub = BridgeStub::spawn_with(1..=500, u64::MAX, Some(100)).await;
    let runtime = start_runtime(&stub.base_url, CursorAdvance::ByLimit);

    let mut stream = runtime
        .state_sync_client()
        .subscribe(request(0, u64::MAX, 100))
        .await
        .unwrap();
    let first = stream.pages.recv().await.unwrap();
    assert_eq!(first.len(), 100);

    // Second fetch hangs upstream until the node stops
    runtime.shutdown().await;

    let (rest, summary) = tokio::time::timeout(Duration::from_secs(5), stream.collect())
        .await
        .expect("stream ends after shutdown")
        .unwrap();
    assert!(rest.is_empty());
    assert_eq!(summary.termination, Termination::Cancelled);
    assert_eq!(summary.next_from_id, 100);
}

#[tokio::test]
async fn test_unreachable_bridge_fails_stream() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let runtime = start_runtime(&base_url, CursorAdvance::ByLimit);
    let err = runtime
        .state_sync_client()
        .subscribe(request(0, u64::MAX, 10))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HandlerError::StateSync(StateSyncError::UpstreamUnavailable { .. })
    ));
    runtime.shutdown().await;
}
