//! Daemon settings subsystem.
//!
//! # Data Flow
//! ```text
//! daemon.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DaemonConfig (validated, immutable)
//!     → paths.rs (resolve home, config file, backups, PID file)
//! ```
//!
//! # Design Decisions
//! - These settings configure the daemon; the managed configuration
//!   document is handled by `store` and never validated
//! - All fields have defaults to allow minimal or missing settings files
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod paths;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use paths::ConfigLocations;
pub use schema::DaemonConfig;
pub use schema::ListenerConfig;
pub use schema::PathsConfig;
pub use schema::RestartConfig;
pub use schema::TransformerConfig;
pub use schema::UiConfig;
