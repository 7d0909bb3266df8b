//! In-process stand-in for the bridge REST API.
//!
//! Serves `GET /clerk/event-record/list?from-id=&to-time=&limit=` from a fixed,
//! ascending id list. Record `n` is timestamped `BASE_TIME + n`. Requests
//! missing any query parameter are answered `400 Bad Request`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const BASE_TIME: u64 = 1_700_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(rename = "from-id")]
    pub from_id: u64,
    #[serde(rename = "to-time")]
    pub to_time: u64,
    pub limit: u64,
}

#[derive(Clone)]
struct Upstream {
    ids: Arc<Vec<u64>>,
    /// Most records served per page, whatever the requested limit
    cap: u64,
    /// Requests at or past this cursor never complete
    stall_from: Option<u64>,
    log: Arc<Mutex<Vec<PageRequest>>>,
}

pub struct BridgeStub {
    pub base_url: String,
    log: Arc<Mutex<Vec<PageRequest>>>,
}

impl BridgeStub {
    pub async fn spawn(ids: impl IntoIterator<Item = u64>) -> Self {
        Self::spawn_with(ids, u64::MAX, None).await
    }

    pub async fn spawn_with(
        ids: impl IntoIterator<Item = u64>,
        cap: u64,
        stall_from: Option<u64>,
    ) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        let mut ids: Vec<u64> = ids.into_iter().collect();
        ids.sort_unstable();
        let upstream = Upstream {
            ids: Arc::new(ids),
            cap,
            stall_from,
            log: Arc::clone(&log),
        };

        let app = Router::new()
            .route("/clerk/event-record/list", get(list_event_records))
            .with_state(upstream);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            log,
        }
    }

    /// Page requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<PageRequest> {
        self.log.lock().clone()
    }
}

async fn list_event_records(
    State(upstream): State<Upstream>,
    Query(request): Query<PageRequest>,
) -> Json<Value> {
    upstream.log.lock().push(request);

    if upstream.stall_from.is_some_and(|at| request.from_id >= at) {
        std::future::pending::<()>().await;
    }

    Json(page(&upstream, request))
}

pub fn record(id: u64) -> Value {
    let time = DateTime::<Utc>::from_timestamp((BASE_TIME + id) as i64, 0).unwrap();
    json!({
        "id": id,
        "contract": "0x0000000000000000000000000000000000001001",
        "data": format!("0x{:064x}", id),
        "tx_hash": format!("0x{:064x}", id * 7),
        "log_index": id % 4,
        "bor_chain_id": "137",
        "record_time": time.to_rfc3339(),
    })
}

fn page(upstream: &Upstream, request: PageRequest) -> Value {
    let result: Vec<Value> = upstream
        .ids
        .iter()
        .copied()
        .filter(|id| *id > request.from_id && BASE_TIME + id <= request.to_time)
        .take(request.limit.min(upstream.cap) as usize)
        .map(record)
        .collect();

    json!({ "height": "4096", "result": result })
}
