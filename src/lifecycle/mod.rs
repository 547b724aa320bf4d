//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve locations → Create directories → Write PID file → Serve
//!
//! Shutdown (shutdown.rs, signals.rs):
//!     SIGTERM/SIGINT → Broadcast shutdown → Drain HTTP → Remove PID file
//!
//! Restart (process.rs):
//!     `router-control restart` → SIGTERM running instance
//!         → wait for PID file removal → spawn detached `start`
//! ```
//!
//! # Design Decisions
//! - The PID file is the only handle on a running instance
//! - Restart is signal-and-exit; no supervision beyond that

pub mod pidfile;
pub mod process;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use pidfile::PidFile;
pub use shutdown::Shutdown;
