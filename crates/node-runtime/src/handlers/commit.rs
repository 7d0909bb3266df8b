//! Commit-boundary handler (qc-18)
//!
//! The consensus engine sends one [`CommitRequest`] per committed block and
//! waits for the report. Boundaries are processed strictly in arrival order,
//! each on the blocking pool since the store may fsync.

use std::sync::Arc;

use qc_18_checkpoint::{BlockCommit, CheckpointApi, CheckpointResult, CommitReport};
use quantum_telemetry::log_block_event;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use super::HandlerError;

/// One block's commitment activity plus the reply slot.
pub struct CommitRequest {
    pub commit: BlockCommit,
    pub reply: oneshot::Sender<CheckpointResult<CommitReport>>,
}

/// Handler for commit boundaries.
pub struct CommitHandler<A: ?Sized> {
    receiver: mpsc::Receiver<CommitRequest>,
    api: Arc<A>,
    shutdown: watch::Receiver<bool>,
}

impl<A: CheckpointApi + ?Sized + 'static> CommitHandler<A> {
    pub fn new(
        receiver: mpsc::Receiver<CommitRequest>,
        api: Arc<A>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            receiver,
            api,
            shutdown,
        }
    }

    /// Run until shutdown or until every sender is dropped. A boundary that
    /// has been received is always processed to completion.
    pub async fn run(mut self) {
        info!("[qc-18] Commit handler started");

        loop {
            if *self.shutdown.borrow() {
                info!("[qc-18] Shutdown signalled, exiting");
                return;
            }
            tokio::select! {
                request = self.receiver.recv() => match request {
                    Some(request) => self.handle(request).await,
                    None => {
                        info!("[qc-18] Commit channel closed, exiting");
                        return;
                    }
                },
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
    }

    async fn handle(&self, request: CommitRequest) {
        let CommitRequest { commit, reply } = request;
        let height = commit.block.height;
        let api = Arc::clone(&self.api);
        let result = match tokio::task::spawn_blocking(move || api.process_commit(commit)).await {
            Ok(result) => result,
            Err(e) => {
                // Reply dropped: the caller sees the handler as closed
                log_block_event!(error, "qc-18", "commit boundary aborted", height, error = %e);
                return;
            }
        };

        match &result {
            Ok(report) => debug!(
                "[qc-18] block #{} processed (checkpoint {:?}, milestone {:?})",
                height, report.checkpoint.phase, report.milestone.phase
            ),
            Err(e) => log_block_event!(
                error,
                "qc-18",
                "commit boundary failed, block must not be committed",
                height,
                error = %e
            ),
        }

        if reply.send(result).is_err() {
            warn!("[qc-18] caller for block #{} went away", height);
        }
    }
}

/// Sending half used by the consensus engine.
#[derive(Clone)]
pub struct CommitClient {
    sender: mpsc::Sender<CommitRequest>,
}

impl CommitClient {
    pub fn new(sender: mpsc::Sender<CommitRequest>) -> Self {
        Self { sender }
    }

    /// Submit one boundary and wait for its report.
    pub async fn commit(&self, commit: BlockCommit) -> Result<CommitReport, HandlerError> {
        let (reply, rx) = oneshot::channel();
        self.sender
            .send(CommitRequest { commit, reply })
            .await
            .map_err(|_| HandlerError::Closed)?;
        Ok(rx.await.map_err(|_| HandlerError::Closed)??)
    }
}
