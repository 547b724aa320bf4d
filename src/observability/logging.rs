//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level so operators can raise
//! verbosity without editing the daemon settings.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives when neither `RUST_LOG` nor a level is configured.
pub const DEFAULT_DIRECTIVES: &str = "router_control=info,tower_http=info";

/// Build the filter for `log_level` (e.g. "debug").
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = if log_level.trim().is_empty() {
            DEFAULT_DIRECTIVES.to_string()
        } else {
            format!("router_control={level},tower_http={level}", level = log_level.trim())
        };
        EnvFilter::new(directives)
    })
}

/// Install the global subscriber. Safe to call more than once.
pub fn init_tracing(log_level: &str) {
    let result = tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(tracing_subscriber::fmt::layer())
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
