//! # Checkpoint Node Benchmarks
//!
//! | Subsystem | Operation | Target |
//! |-----------|-----------|--------|
//! | qc-18 Checkpoint | Propose + accept boundary pair | < 100µs in memory |
//! | qc-18 Checkpoint | Containing-height lookup | O(n) scan, < 1ms at 1k confirmed |
//! | qc-19 State Sync | Relay 10k records from memory | throughput |

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use parking_lot::RwLock;
use serde_json::json;
use tokio::sync::watch;

use qc_18_checkpoint::{
    AckVerdict, BlockCommit, BoundaryInput, Checkpoint, CheckpointApi, CheckpointConfig,
    CheckpointQueryApi, CheckpointService, CommitmentHeader, InMemoryKVStore,
};
use qc_19_state_sync::{
    ChannelPageSink, EventRecordFetcher, StateSyncConfig, StateSyncResult, StateSyncService,
    StreamEventsRequest, UpstreamPage,
};

const SPAN: u64 = 256;

fn service() -> CheckpointService<InMemoryKVStore> {
    CheckpointService::new(
        CheckpointConfig::default(),
        Arc::new(RwLock::new(InMemoryKVStore::new())),
    )
}

fn checkpoint(seq: u64) -> Checkpoint {
    let start = (seq - 1) * SPAN;
    Checkpoint::new(
        seq,
        CommitmentHeader::new(start, start + SPAN - 1, [0x42; 32], [0x07; 20], "137", seq),
    )
}

/// Confirm checkpoints `1..=n`, two boundaries each.
fn confirm_n(svc: &CheckpointService<InMemoryKVStore>, n: u64) {
    for seq in 1..=n {
        confirm_single(svc, seq);
    }
}

// ============================================================================
// QC-18: Commit boundaries
// ============================================================================

fn bench_commit_boundaries(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-checkpoint");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("propose_accept_pair", |b| {
        let svc = service();
        let mut seq = 0;
        b.iter(|| {
            seq += 1;
            confirm_single(&svc, seq);
        })
    });

    group.bench_function("idle_boundary", |b| {
        let svc = service();
        b.iter(|| black_box(svc.process_commit(BlockCommit::empty(1, 1)).unwrap()))
    });

    for confirmed in [10u64, 100, 1000] {
        let svc = service();
        confirm_n(&svc, confirmed);
        let height = (confirmed - 1) * SPAN + 1;

        group.bench_with_input(
            BenchmarkId::new("checkpoint_containing", confirmed),
            &height,
            |b, &height| b.iter(|| black_box(svc.checkpoint_containing(height).unwrap())),
        );
    }

    group.finish();
}

fn confirm_single(svc: &CheckpointService<InMemoryKVStore>, seq: u64) {
    svc.process_commit(
        BlockCommit::empty(seq * 2, seq).with_checkpoint(BoundaryInput::propose(checkpoint(seq))),
    )
    .unwrap();
    svc.process_commit(
        BlockCommit::empty(seq * 2 + 1, seq)
            .with_checkpoint(BoundaryInput::verdict(AckVerdict::Accepted)),
    )
    .unwrap();
}

// ============================================================================
// QC-19: Relay loop
// ============================================================================

struct MemoryFetcher {
    total: u64,
}

#[async_trait]
impl EventRecordFetcher for MemoryFetcher {
    async fn fetch(&self, from_id: u64, _to_time: u64, limit: u64) -> StateSyncResult<UpstreamPage> {
        let records: Vec<_> = (from_id + 1..=self.total)
            .take(limit as usize)
            .map(|id| {
                json!({
                    "id": id,
                    "contract": format!("0x{:040x}", 0x1001),
                    "data": "0x00",
                    "tx_hash": format!("0x{id:064x}"),
                    "log_index": 0, "bor_chain_id": "137",
                    "record_time": "2024-03-01T12:00:00Z"
                })
            })
            .collect();
        Ok(UpstreamPage {
            height: "1".into(),
            result: json!(records),
        })
    }
}

fn bench_relay(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-19-state-sync");
    let rt = tokio::runtime::Runtime::new().unwrap();
    let total = 10_000u64;

    for limit in [100u64, 1000] {
        let svc = StateSyncService::new(StateSyncConfig::default(), MemoryFetcher { total });
        group.throughput(Throughput::Elements(total));
        group.bench_with_input(BenchmarkId::new("relay_all", limit), &limit, |b, &limit| {
            b.iter(|| {
                rt.block_on(async {
                    let (sink, mut pages) = ChannelPageSink::channel(16);
                    let drain = tokio::spawn(async move { while pages.recv().await.is_some() {} });
                    let (_cancel_tx, cancel) = watch::channel(false);
                    let summary = svc
                        .relay(
                            StreamEventsRequest {
                                from_id: 0,
                                to_time: u64::MAX,
                                limit,
                            },
                            &sink,
                            cancel,
                        )
                        .await
                        .unwrap();
                    drop(sink);
                    drain.await.unwrap();
                    black_box(summary)
                })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_commit_boundaries, bench_relay);
criterion_main!(benches);
