//! # Subsystem Container
//!
//! Configuration plus the wired subsystem instances.

pub mod config;
pub mod subsystems;

pub use config::{load_config, ConfigError, NodeConfig, StateSyncSettings, StorageConfig};
pub use subsystems::{ContainerError, NodeContainer, SubsystemContainer};
