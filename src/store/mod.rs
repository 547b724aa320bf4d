//! Configuration persistence subsystem.
//!
//! # Data Flow
//! ```text
//! save request
//!     → backup.rs (copy current file to <name>.<timestamp>.bak)
//!     → file.rs (serialize → temp file → fsync → rename)
//!     → canonical config file
//!
//! read request
//!     → file.rs (read + parse, no caching)
//! ```
//!
//! # Design Decisions
//! - The configuration is opaque JSON; nothing here interprets its schema
//! - Writes are atomic: readers see either the old or the new file
//! - Backups are append-only and never pruned
//! - Backup failures are warnings, never errors for the caller

pub mod backup;
pub mod error;
pub mod file;
pub mod model;

pub use backup::{BackupHandle, BackupManager, ConfigBackup, BackupOutcome, BackupWarning};
pub use error::StoreError;
pub use file::ConfigStore;
pub use model::{Configuration, ProviderEntry};
