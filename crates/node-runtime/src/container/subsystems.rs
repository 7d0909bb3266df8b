//! # Subsystem Container
//!
//! Holds the subsystem instances and the state accessor they share.
//!
//! ```text
//! Level 0: State accessor (FileBackedKVStore), bridge fetcher (HTTP)
//! Level 1: Checkpoint coordinator (qc-18), state-sync relay (qc-19)
//! ```
//!
//! ## Thread Safety
//!
//! - Services wrapped in `Arc` for shared ownership
//! - The state accessor sits behind one `RwLock`; commit writes, queries read

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use qc_18_checkpoint::{
    CheckpointService, FileBackedKVStore, KVStoreError, KeyValueStore, QueryHandler, SharedStore,
};
use qc_19_state_sync::{
    EventRecordFetcher, HttpEventRecordFetcher, StateSyncError, StateSyncService,
};
use thiserror::Error;

use crate::container::config::NodeConfig;

/// Container errors.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("failed to open state store: {0}")]
    Storage(#[from] KVStoreError),

    #[error("failed to build bridge client: {0}")]
    Bridge(#[from] StateSyncError),

    #[error("failed to create data dir: {0}")]
    DataDir(#[from] std::io::Error),
}

/// Production wiring: file-backed state, HTTP bridge client.
pub type NodeContainer = SubsystemContainer<FileBackedKVStore, HttpEventRecordFetcher>;

/// Central container holding all subsystem instances.
pub struct SubsystemContainer<S, F> {
    pub config: NodeConfig,

    /// Shared state accessor
    pub kv: SharedStore<S>,

    /// Checkpoint coordinator (qc-18)
    pub checkpoint: Arc<CheckpointService<S>>,

    /// State-sync relay (qc-19)
    pub state_sync: Arc<StateSyncService<F>>,
}

impl<S: KeyValueStore, F: EventRecordFetcher> SubsystemContainer<S, F> {
    /// Wire subsystems over explicit backends.
    pub fn with_backends(config: NodeConfig, kv: S, fetcher: F) -> Self {
        let kv = Arc::new(RwLock::new(kv));
        let checkpoint = Arc::new(CheckpointService::new(
            config.checkpoint.clone(),
            Arc::clone(&kv),
        ));
        let state_sync = Arc::new(StateSyncService::new(
            config.state_sync.relay_config(),
            fetcher,
        ));

        info!(
            "[runtime] subsystems wired (ack windows {}s/{}s, page cap {}, advance {})",
            config.checkpoint.checkpoint_ack_window_secs,
            config.checkpoint.milestone_ack_window_secs,
            config.state_sync.max_page_limit,
            config.state_sync.advance
        );

        Self {
            config,
            kv,
            checkpoint,
            state_sync,
        }
    }

    /// Query handler over the checkpoint coordinator.
    pub fn query_handler(&self) -> QueryHandler<Arc<CheckpointService<S>>> {
        QueryHandler::new(Arc::clone(&self.checkpoint))
    }
}

impl NodeContainer {
    /// Open the on-disk state and build the bridge client.
    pub fn open(config: NodeConfig) -> Result<Self, ContainerError> {
        std::fs::create_dir_all(&config.storage.data_dir)?;
        let kv = FileBackedKVStore::open(config.storage.state_file())?;
        let fetcher = HttpEventRecordFetcher::new(
            &config.state_sync.bridge_endpoint,
            config.state_sync.http_timeout(),
        )?;

        info!(
            "[runtime] state at {:?}, bridge at {}",
            config.storage.state_file(),
            config.state_sync.bridge_endpoint
        );
        Ok(Self::with_backends(config, kv, fetcher))
    }
}
