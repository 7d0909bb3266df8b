//! # Checkpoint Integration Flows
//!
//! Commit boundaries fed through the runtime's commit handler against the
//! file-backed state, then read back through the query surface, including
//! after a restart.
//!
//! ```text
//! CommitClient ──CommitRequest──→ CommitHandler ──→ CheckpointService ──→ checkpoint.state
//!                                                          │
//!                                    QueryHandler ←────────┘
//! ```

use serde_json::json;

use node_runtime::{NodeConfig, NodeContainer, NodeRuntime};
use qc_18_checkpoint::{
    AckVerdict, BlockCommit, BoundaryInput, Checkpoint, CheckpointApi, CheckpointQuery,
    CommitmentHeader, Milestone, QueryStatus, TransitionOutcome,
};

fn config_in(dir: &std::path::Path) -> NodeConfig {
    let mut config = NodeConfig::default();
    config.storage.data_dir = dir.to_path_buf();
    config
}

fn header(start: u64, end: u64, timestamp: u64) -> CommitmentHeader {
    CommitmentHeader::new(start, end, [0x5a; 32], [0x0b; 20], "137", timestamp)
}

fn propose_checkpoint(height: u64, time: u64, checkpoint: Checkpoint) -> BlockCommit {
    BlockCommit::empty(height, time).with_checkpoint(BoundaryInput::propose(checkpoint))
}

fn checkpoint_verdict(height: u64, time: u64, verdict: AckVerdict) -> BlockCommit {
    BlockCommit::empty(height, time).with_checkpoint(BoundaryInput::verdict(verdict))
}

#[tokio::test]
async fn test_lifecycle_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let milestone = Milestone::new(header(0, 15, 1000));

    {
        let mut runtime = NodeRuntime::new(NodeContainer::open(config_in(dir.path())).unwrap());
        runtime.start();
        let client = runtime.commit_client();

        client
            .commit(propose_checkpoint(10, 1000, Checkpoint::new(1, header(0, 255, 1000))))
            .await
            .unwrap();

        // Checkpoint accepted and a milestone proposed in the same block
        let report = client
            .commit(
                checkpoint_verdict(11, 1010, AckVerdict::Accepted)
                    .with_milestone(BoundaryInput::propose(milestone.clone())),
            )
            .await
            .unwrap();
        assert_eq!(report.checkpoint.confirmed_number(), Some(1));

        client
            .commit(
                propose_checkpoint(20, 1500, Checkpoint::new(2, header(256, 511, 1500)))
                    .with_milestone(BoundaryInput::verdict(AckVerdict::Accepted)),
            )
            .await
            .unwrap();
        let report = client
            .commit(checkpoint_verdict(21, 2000, AckVerdict::Rejected))
            .await
            .unwrap();
        assert!(report.checkpoint.is_no_ack());

        runtime.shutdown().await;
    }

    let container = NodeContainer::open(config_in(dir.path())).unwrap();
    let queries = container.query_handler();

    let count = queries.handle(&CheckpointQuery::AckCount);
    assert_eq!(count.body, Some(json!({ "result": 1 })));

    let latest = queries.handle(&CheckpointQuery::LatestCheckpoint);
    assert_eq!(latest.status, QueryStatus::Ok);
    assert_eq!(latest.body.unwrap()["result"]["id"], json!(1));

    let buffered = queries.handle(&CheckpointQuery::BufferedCheckpoint);
    assert_eq!(buffered.status, QueryStatus::NoContent);

    let last_no_ack = queries.handle(&CheckpointQuery::CheckpointLastNoAck);
    assert_eq!(last_no_ack.body, Some(json!({ "result": 2000 })));

    let covering = queries.handle(&CheckpointQuery::CheckpointContaining("100".into()));
    assert_eq!(covering.status, QueryStatus::Ok);
    let uncovered = queries.handle(&CheckpointQuery::CheckpointContaining("300".into()));
    assert_eq!(uncovered.status, QueryStatus::NotFound);

    let milestone_count = queries.handle(&CheckpointQuery::MilestoneCount);
    assert_eq!(milestone_count.body, Some(json!({ "result": 1 })));
    let latest_milestone = queries.handle(&CheckpointQuery::LatestMilestone);
    assert_eq!(
        latest_milestone.body.unwrap()["result"]["milestone_id"],
        json!(milestone.milestone_id.as_str())
    );
}

#[tokio::test]
async fn test_expired_milestone_recorded_by_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = NodeRuntime::new(NodeContainer::open(config_in(dir.path())).unwrap());
    runtime.start();
    let client = runtime.commit_client();
    let window = runtime.container().config.checkpoint.milestone_ack_window_secs;

    let milestone = Milestone::new(header(0, 15, 100));
    client
        .commit(BlockCommit::empty(1, 100).with_milestone(BoundaryInput::propose(milestone.clone())))
        .await
        .unwrap();

    // Still inside the window
    let held = client
        .commit(BlockCommit::empty(2, 100 + window))
        .await
        .unwrap();
    assert_eq!(
        held.milestone.outcome,
        TransitionOutcome::StillBuffered(milestone.milestone_id.clone())
    );

    let expired_at = 100 + window + 1;
    let report = client
        .commit(BlockCommit::empty(3, expired_at))
        .await
        .unwrap();
    assert_eq!(
        report.milestone.outcome,
        TransitionOutcome::NoAcked {
            id: milestone.milestone_id.clone(),
            timestamp: expired_at,
            expired: true,
        }
    );

    let queries = runtime.container().query_handler();
    let by_id = queries.handle(&CheckpointQuery::NoAckMilestone(
        milestone.milestone_id.as_str().to_uppercase().replacen("0X", "0x", 1),
    ));
    assert_eq!(by_id.body, Some(json!({ "result": expired_at })));

    let last = queries.handle(&CheckpointQuery::LastNoAckMilestone);
    assert_eq!(
        last.body,
        Some(json!({ "result": milestone.milestone_id.as_str() }))
    );
    assert_eq!(
        queries.handle(&CheckpointQuery::MilestoneCount).body,
        Some(json!({ "result": 0 }))
    );

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_submitted_checkpoint_enters_at_next_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = NodeRuntime::new(NodeContainer::open(config_in(dir.path())).unwrap());
    runtime.start();
    let container = runtime.container();
    let client = runtime.commit_client();

    container
        .checkpoint
        .submit_checkpoint(Checkpoint::new(1, header(0, 63, 50)))
        .unwrap();
    assert_eq!(
        container
            .query_handler()
            .handle(&CheckpointQuery::BufferedCheckpoint)
            .status,
        QueryStatus::NoContent
    );

    client.commit(BlockCommit::empty(5, 60)).await.unwrap();
    let buffered = container
        .query_handler()
        .handle(&CheckpointQuery::BufferedCheckpoint);
    assert_eq!(buffered.status, QueryStatus::Ok);
    assert_eq!(buffered.body.unwrap()["result"]["id"], json!(1));

    client
        .commit(checkpoint_verdict(6, 61, AckVerdict::Accepted))
        .await
        .unwrap();
    assert!(container
        .checkpoint
        .submit_checkpoint(Checkpoint::new(1, header(0, 63, 70)))
        .is_err());

    runtime.shutdown().await;
}

#[tokio::test]
async fn test_rejected_boundary_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut runtime = NodeRuntime::new(NodeContainer::open(config_in(dir.path())).unwrap());
    runtime.start();
    let client = runtime.commit_client();

    // Valid milestone alongside an invalid checkpoint: the whole boundary fails
    let result = client
        .commit(
            propose_checkpoint(1, 10, Checkpoint::new(1, header(10, 5, 10)))
                .with_milestone(BoundaryInput::propose(Milestone::new(header(0, 15, 10)))),
        )
        .await;
    assert!(result.is_err());
    runtime.shutdown().await;

    let container = NodeContainer::open(config_in(dir.path())).unwrap();
    let queries = container.query_handler();
    assert_eq!(
        queries.handle(&CheckpointQuery::BufferedMilestone).status,
        QueryStatus::NoContent
    );
    assert_eq!(
        queries.handle(&CheckpointQuery::BufferedCheckpoint).status,
        QueryStatus::NoContent
    );
}
