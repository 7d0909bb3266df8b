//! # Quantum-Chain Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── bridge_stub.rs        # In-process bridge REST API
//!     ├── checkpoint_flows.rs   # Commit path through the runtime, persistence
//!     └── state_sync_flows.rs   # Streaming over HTTP, resume, shutdown
//!
//! tests/benches/
//! └── checkpoint_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! cargo test -p qc-tests integration::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

pub mod integration;
