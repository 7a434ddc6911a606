//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardianConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::GuardianConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const MAX_ATTEMPTS: u32 = 10;

pub fn validate_config(config: &GuardianConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.chain.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::new("chain.rpc_url", e.to_string()));
    }
    for url in &config.chain.failover_urls {
        if url.parse::<url::Url>().is_err() {
            errors.push(ValidationError::new("chain.failover_urls", format!("invalid URL '{}'", url)));
        }
    }
    if config.chain.chain_id == 0 {
        errors.push(ValidationError::new("chain.chain_id", "must be non-zero"));
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be greater than zero"));
    }
    if config.chain.receipt_timeout_secs == 0 {
        errors.push(ValidationError::new("chain.receipt_timeout_secs", "must be greater than zero"));
    }

    if config.signer.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new("signer.private_key_env", "must name an environment variable"));
    }

    if !(1..=MAX_ATTEMPTS).contains(&config.retries.gas_attempts) {
        errors.push(ValidationError::new(
            "retries.gas_attempts",
            format!("must be between 1 and {}", MAX_ATTEMPTS),
        ));
    }
    if !(1..=MAX_ATTEMPTS).contains(&config.retries.outer_attempts) {
        errors.push(ValidationError::new(
            "retries.outer_attempts",
            format!("must be between 1 and {}", MAX_ATTEMPTS),
        ));
    }

    if config.batch.concurrency == 0 {
        errors.push(ValidationError::new("batch.concurrency", "must be at least 1"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
