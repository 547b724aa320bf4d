//! Router Control Daemon Library
//!
//! Manages one JSON configuration file on disk (atomic writes, append-only
//! backups) and exposes it over HTTP together with transformer listing and
//! a deferred restart.

pub mod config;
pub mod control;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::DaemonConfig;
pub use control::ControlService;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use store::{BackupManager, ConfigStore, Configuration};
