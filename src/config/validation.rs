//! Daemon settings validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, delay bounded)
//! - Detect duplicate transformer names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: DaemonConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::DaemonConfig;

/// Longest restart delay accepted, in milliseconds.
pub const MAX_RESTART_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid {field} address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("restart.delay_ms {0} exceeds {max}", max = MAX_RESTART_DELAY_MS)]
    RestartDelayTooLong(u64),

    #[error("restart.program must not be blank")]
    BlankRestartProgram,

    #[error("transformer at index {0} has an empty name")]
    EmptyTransformerName(usize),

    #[error("duplicate transformer name {0:?}")]
    DuplicateTransformer(String),
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &DaemonConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "listener.request_timeout_secs" });
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "listener.max_body_bytes" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if config.restart.delay_ms > MAX_RESTART_DELAY_MS {
        errors.push(ValidationError::RestartDelayTooLong(config.restart.delay_ms));
    }
    if matches!(&config.restart.program, Some(p) if p.trim().is_empty()) {
        errors.push(ValidationError::BlankRestartProgram);
    }

    let mut seen = HashSet::new();
    for (i, transformer) in config.transformers.iter().enumerate() {
        if transformer.name.trim().is_empty() {
            errors.push(ValidationError::EmptyTransformerName(i));
        } else if !seen.insert(transformer.name.as_str()) {
            errors.push(ValidationError::DuplicateTransformer(transformer.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TransformerConfig;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&DaemonConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = DaemonConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.listener.request_timeout_secs = 0;
        config.restart.delay_ms = MAX_RESTART_DELAY_MS + 1;
        config.restart.program = Some("  ".into());

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::BlankRestartProgram));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = DaemonConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_transformers() {
        let mut config = DaemonConfig::default();
        config.transformers = vec![
            TransformerConfig { name: "anthropic".into(), endpoint: Some("/v1/messages".into()) },
            TransformerConfig { name: "anthropic".into(), endpoint: None },
            TransformerConfig { name: "".into(), endpoint: None },
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateTransformer("anthropic".into()),
                ValidationError::EmptyTransformerName(2),
            ]
        );
    }
}
