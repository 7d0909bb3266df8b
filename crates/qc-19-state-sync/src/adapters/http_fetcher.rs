//! HTTP Event Record Fetcher
//!
//! Implements `EventRecordFetcher` against the bridge REST endpoint
//! `GET {base}/clerk/event-record/list?from-id=&to-time=&limit=`.

use crate::error::{StateSyncError, StateSyncResult};
use crate::ports::outbound::{EventRecordFetcher, UpstreamPage};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::time::Duration;
use tracing::{debug, error};

const EVENT_RECORD_LIST: &str = "clerk/event-record/list";

pub struct HttpEventRecordFetcher {
    client: Client,
    endpoint: Url,
}

impl HttpEventRecordFetcher {
    /// Create a fetcher for the bridge API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> StateSyncResult<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| StateSyncError::invalid(format!("bad bridge endpoint {base_url}: {e}")))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(EVENT_RECORD_LIST)
            .map_err(|e| StateSyncError::invalid(e.to_string()))?;

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(|e| StateSyncError::invalid(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    /// Full request URL for one page.
    pub fn page_url(&self, from_id: u64, to_time: u64, limit: u64) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("from-id", &from_id.to_string())
            .append_pair("to-time", &to_time.to_string())
            .append_pair("limit", &limit.to_string());
        url
    }
}

#[async_trait]
impl EventRecordFetcher for HttpEventRecordFetcher {
    async fn fetch(&self, from_id: u64, to_time: u64, limit: u64) -> StateSyncResult<UpstreamPage> {
        let url = self.page_url(from_id, to_time, limit);
        debug!("[qc-19] fetching {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            error!("[qc-19] error while fetching event records: {}", e);
            StateSyncError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            error!("[qc-19] bridge API answered {}", status);
            return Err(StateSyncError::UpstreamUnavailable {
                reason: format!("bridge API answered {status}"),
            });
        }

        response.json::<UpstreamPage>().await.map_err(|e| {
            error!("[qc-19] malformed event record envelope: {}", e);
            StateSyncError::EncodingError {
                reason: e.to_string(),
            }
        })
    }
}
