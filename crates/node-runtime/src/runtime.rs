//! # Node Runtime
//!
//! Owns the subsystem container, the handler tasks and the shutdown signal.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults + `QC_*` environment)
//! 2. Open state and build the bridge client (container)
//! 3. Start handlers (commit boundaries, state-sync subscriptions)
//! 4. Signal ready
//!
//! ## Shutdown Sequence
//!
//! 1. Signal shutdown to all handlers; open streams are cancelled
//! 2. Wait for handler tasks (bounded)
//! 3. Exit

use std::sync::Arc;
use std::time::Duration;

use qc_18_checkpoint::KeyValueStore;
use qc_19_state_sync::EventRecordFetcher;
use quantum_telemetry::log_event;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::container::SubsystemContainer;
use crate::handlers::{
    CommitClient, CommitHandler, CommitRequest, StateSyncClient, StateSyncHandler,
    StreamSubscription,
};

/// Queue depth of the commit channel.
const COMMIT_QUEUE: usize = 64;
/// Queue depth of the subscription channel.
const SUBSCRIPTION_QUEUE: usize = 32;
/// Upper bound on waiting for handlers at shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

struct HandlerInbox {
    commits: mpsc::Receiver<CommitRequest>,
    subscriptions: mpsc::Receiver<StreamSubscription>,
}

/// The node runtime orchestrating both subsystems.
pub struct NodeRuntime<S, F> {
    container: Arc<SubsystemContainer<S, F>>,
    commit_tx: mpsc::Sender<CommitRequest>,
    subscription_tx: mpsc::Sender<StreamSubscription>,
    inbox: Option<HandlerInbox>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<S, F> NodeRuntime<S, F>
where
    S: KeyValueStore + 'static,
    F: EventRecordFetcher + 'static,
{
    pub fn new(container: SubsystemContainer<S, F>) -> Self {
        let (commit_tx, commits) = mpsc::channel(COMMIT_QUEUE);
        let (subscription_tx, subscriptions) = mpsc::channel(SUBSCRIPTION_QUEUE);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            container: Arc::new(container),
            commit_tx,
            subscription_tx,
            inbox: Some(HandlerInbox {
                commits,
                subscriptions,
            }),
            tasks: Vec::new(),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Spawn the handler tasks. Calling it twice is a no-op.
    pub fn start(&mut self) {
        let Some(inbox) = self.inbox.take() else {
            warn!("[runtime] already started");
            return;
        };

        let commit = CommitHandler::new(
            inbox.commits,
            Arc::clone(&self.container.checkpoint),
            self.shutdown_rx.clone(),
        );
        let state_sync = StateSyncHandler::new(
            inbox.subscriptions,
            Arc::clone(&self.container.state_sync),
            self.shutdown_rx.clone(),
        );

        self.tasks.push(tokio::spawn(commit.run()));
        self.tasks.push(tokio::spawn(state_sync.run()));

        log_event!(
            info,
            "runtime",
            "handlers started",
            commit_queue = COMMIT_QUEUE,
            subscription_queue = SUBSCRIPTION_QUEUE
        );
    }

    /// Client for the consensus engine's commit path.
    pub fn commit_client(&self) -> CommitClient {
        CommitClient::new(self.commit_tx.clone())
    }

    /// Client for opening event streams.
    pub fn state_sync_client(&self) -> StateSyncClient {
        StateSyncClient::new(
            self.subscription_tx.clone(),
            self.container.config.state_sync.page_buffer,
        )
    }

    pub fn container(&self) -> Arc<SubsystemContainer<S, F>> {
        Arc::clone(&self.container)
    }

    /// Signal shutdown and wait for the handlers to exit.
    pub async fn shutdown(mut self) {
        info!("[runtime] Initiating graceful shutdown...");

        if self.shutdown_tx.send(true).is_err() {
            warn!("[runtime] no handler was listening for shutdown");
        }

        for task in self.tasks.drain(..) {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("[runtime] handler task failed: {}", e),
                Err(_) => warn!("[runtime] handler did not stop within {:?}", SHUTDOWN_GRACE),
            }
        }

        info!("[runtime] Shutdown complete");
    }
}
