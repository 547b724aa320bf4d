//! Transport-independent control operations.
//!
//! # Data Flow
//! ```text
//! HTTP handler (http/routes.rs)
//!     → service.rs (ControlService façade)
//!         → store/ (read, backup, write)
//!         → registry.rs (transformer listing)
//!         → restart.rs (ack now, spawn later)
//! ```
//!
//! # Design Decisions
//! - Nothing here knows about HTTP; handlers only translate results
//! - Configuration is returned unredacted, including credentials
//! - Restart spawn failures are never reported back to the requester

pub mod error;
pub mod registry;
pub mod restart;
pub mod service;

pub use error::ControlError;
pub use registry::{SharedRegistry, TransformerDescriptor, TransformerEntry, TransformerRegistry};
pub use restart::{
    PendingRestart, ProcessSpawner, RestartCommand, RestartCoordinator, RestartPhase, SystemSpawner,
};
pub use service::{ActionResult, ControlService};
