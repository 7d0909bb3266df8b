//! # Quantum-Chain Checkpoint Node
//!
//! Runs the checkpoint coordinator and the state-sync relay until Ctrl+C.
//!
//! ```text
//! Consensus ──CommitRequest──→ CommitHandler ──→ CheckpointService ──→ state file
//! Consumers ──Subscription───→ StateSyncHandler ──→ relay task ──→ bridge REST API
//! ```

use anyhow::{Context, Result};
use tracing::info;

use node_runtime::{load_config, NodeContainer, NodeRuntime};
use quantum_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_telemetry(&TelemetryConfig::from_env()).context("failed to initialise logging")?;

    let config = load_config().context("invalid configuration")?;
    let container = NodeContainer::open(config).context("failed to open subsystems")?;

    let mut runtime = NodeRuntime::new(container);
    runtime.start();

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
