//! Daemon settings schema.
//!
//! These are the settings of the daemon itself (listener, paths, restart
//! command), loaded from TOML. The managed configuration document lives in
//! `store` and is never interpreted here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root settings for the control daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DaemonConfig {
    /// HTTP listener settings.
    pub listener: ListenerConfig,

    /// Overrides for on-disk locations.
    pub paths: PathsConfig,

    /// Static UI serving.
    pub ui: UiConfig,

    /// Deferred restart command.
    pub restart: RestartConfig,

    /// Transformers reported by `/api/transformers`.
    pub transformers: Vec<TransformerConfig>,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3456").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3456".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Optional path overrides. Unset paths derive from `home_dir`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PathsConfig {
    pub home_dir: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub backup_dir: Option<PathBuf>,
    pub plugins_dir: Option<PathBuf>,
    pub pid_file: Option<PathBuf>,
}

/// Static UI asset serving.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub enabled: bool,

    /// Directory holding the built UI (index.html and assets).
    pub assets_dir: PathBuf,

    /// `Cache-Control` max-age for assets, in seconds.
    pub max_age_secs: u64,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            assets_dir: PathBuf::from("ui/dist"),
            max_age_secs: 3600,
        }
    }
}

/// Restart command spawned after `/api/restart` is acknowledged.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestartConfig {
    /// Program to run. Defaults to the current executable.
    pub program: Option<String>,

    /// Arguments passed to the program.
    pub args: Vec<String>,

    /// Delay between acknowledgment and spawn, in milliseconds.
    pub delay_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: vec!["restart".to_string()],
            delay_ms: 1000,
        }
    }
}

/// A transformer known to the host application.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TransformerConfig {
    pub name: String,

    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9464".to_string(),
        }
    }
}
