//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID, trace, timeout, body limit)
//!     → AxumRegistrar (adapter for the RouteRegistrar capability)
//!     → routes.rs (transport-neutral handlers)
//!     → control::ControlService
//!     → error.rs (ControlError → status + JSON)
//! ```
//!
//! # Design Decisions
//! - Handlers are registered through `RouteRegistrar`, so the control
//!   routes never name an axum type
//! - No authentication: the daemon is meant to bind to loopback

pub mod error;
pub mod routes;
pub mod server;

pub use routes::{register_control_routes, ApiHandler, ApiReply, ApiRequest, RouteRegistrar, StaticAssets};
pub use server::{AxumRegistrar, HttpServer};
