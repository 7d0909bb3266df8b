//! # Node Runtime Library
//!
//! Wires the checkpoint coordinator (qc-18) and the state-sync relay (qc-19)
//! to their backends and runs their handlers. The `main.rs` binary is a thin
//! shell over [`NodeRuntime`].
//!
//! ## Architectural Patterns
//!
//! - **Hexagonal Architecture**: subsystems expose ports, the container picks adapters
//! - **Channel handlers**: one task per inbound flow, stopped by a shared shutdown signal

#![allow(clippy::type_complexity)]

pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{load_config, ConfigError, NodeConfig, NodeContainer, SubsystemContainer};
pub use handlers::{CommitClient, EventStream, HandlerError, StateSyncClient};
pub use runtime::NodeRuntime;
