//! # Node Configuration
//!
//! Unified configuration for the checkpoint coordinator, the state-sync relay
//! and runtime parameters. Every field has a sane default; `load_config`
//! applies `QC_*` environment overrides on top.

use qc_18_checkpoint::CheckpointConfig;
use qc_19_state_sync::{CursorAdvance, StateSyncConfig, DEFAULT_MAX_PAGE_LIMIT};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Complete node configuration.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Checkpoint coordinator configuration.
    pub checkpoint: CheckpointConfig,
    /// State-sync relay configuration.
    pub state_sync: StateSyncSettings,
}

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Data directory for the state file.
    pub data_dir: PathBuf,
}

impl StorageConfig {
    /// Path of the persisted key-value state.
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("checkpoint.state")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// State-sync relay settings.
#[derive(Debug, Clone)]
pub struct StateSyncSettings {
    /// Base URL of the bridge REST API.
    pub bridge_endpoint: String,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// Upstream page size cap.
    pub max_page_limit: u64,
    /// Cursor advance policy.
    pub advance: CursorAdvance,
    /// Pages buffered per stream before the relay waits on the consumer.
    pub page_buffer: usize,
}

impl StateSyncSettings {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn relay_config(&self) -> StateSyncConfig {
        StateSyncConfig {
            max_page_limit: self.max_page_limit,
            advance: self.advance,
        }
    }
}

impl Default for StateSyncSettings {
    fn default() -> Self {
        Self {
            bridge_endpoint: "http://localhost:1317".to_string(),
            http_timeout_secs: 10,
            max_page_limit: DEFAULT_MAX_PAGE_LIMIT,
            advance: CursorAdvance::ByLimit,
            page_buffer: 16,
        }
    }
}

impl NodeConfig {
    /// Sanity checks before the node starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_sync.bridge_endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("bridge endpoint is empty".into()));
        }
        if self.state_sync.max_page_limit == 0 {
            return Err(ConfigError::Invalid("max page limit must be positive".into()));
        }
        if self.state_sync.page_buffer == 0 {
            return Err(ConfigError::Invalid("page buffer must be positive".into()));
        }
        Ok(())
    }

    /// Apply overrides from a key lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn number(key: &'static str, value: String) -> Result<u64, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key, value })
        }

        if let Some(dir) = lookup("QC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = lookup("QC_CHECKPOINT_ACK_WINDOW_SECS") {
            self.checkpoint.checkpoint_ack_window_secs =
                number("QC_CHECKPOINT_ACK_WINDOW_SECS", v)?;
        }
        if let Some(v) = lookup("QC_MILESTONE_ACK_WINDOW_SECS") {
            self.checkpoint.milestone_ack_window_secs = number("QC_MILESTONE_ACK_WINDOW_SECS", v)?;
        }
        if let Some(v) = lookup("QC_NO_ACK_BACKOFF_SECS") {
            self.checkpoint.no_ack_backoff_secs = number("QC_NO_ACK_BACKOFF_SECS", v)?;
        }
        if let Some(endpoint) = lookup("QC_BRIDGE_ENDPOINT") {
            self.state_sync.bridge_endpoint = endpoint;
        }
        if let Some(v) = lookup("QC_STATE_SYNC_MAX_LIMIT") {
            self.state_sync.max_page_limit = number("QC_STATE_SYNC_MAX_LIMIT", v)?;
        }
        if let Some(v) = lookup("QC_STATE_SYNC_ADVANCE") {
            self.state_sync.advance = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "QC_STATE_SYNC_ADVANCE",
                value: v,
            })?;
        }
        if let Some(v) = lookup("QC_HTTP_TIMEOUT_SECS") {
            self.state_sync.http_timeout_secs = number("QC_HTTP_TIMEOUT_SECS", v)?;
        }
        Ok(())
    }
}

/// Load configuration: defaults plus `QC_*` environment overrides.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    let mut config = NodeConfig::default();
    config.apply_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}
