//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that addresses, URLs and amounts parse
//! - Validate value ranges (timeouts > 0, decimals within U256 range)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FaucetConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, U256};

use crate::config::schema::FaucetConfig;

/// Largest decimal exponent whose scale (10^decimals) fits in a U256.
pub const MAX_DECIMALS: u8 = 77;

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `token.holder`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &FaucetConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = url::Url::parse(&config.node.rpc_url) {
        errors.push(ValidationError::new(
            "node.rpc_url",
            format!("invalid URL '{}': {}", config.node.rpc_url, e),
        ));
    }
    if config.node.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new("node.rpc_timeout_secs", "must be greater than 0"));
    }
    if config.node.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "node.confirmation_timeout_secs",
            "must be greater than 0",
        ));
    }
    if config.node.poll_interval_ms == 0 {
        errors.push(ValidationError::new("node.poll_interval_ms", "must be greater than 0"));
    }

    check_address(&mut errors, "token.address", &config.token.address);
    check_address(&mut errors, "token.holder", &config.token.holder);
    if let Some(symbol) = &config.token.symbol {
        if symbol.trim().is_empty() {
            errors.push(ValidationError::new("token.symbol", "must not be empty"));
        }
    }
    if let Some(decimals) = config.token.decimals {
        if decimals > MAX_DECIMALS {
            errors.push(ValidationError::new(
                "token.decimals",
                format!("{} exceeds maximum of {}", decimals, MAX_DECIMALS),
            ));
        }
    }

    if U256::from_str(config.funding.gas_balance_wei.trim()).is_err() {
        errors.push(ValidationError::new(
            "funding.gas_balance_wei",
            format!("'{}' is not a valid wei amount", config.funding.gas_balance_wei),
        ));
    }

    if config.retries.max_attempts == 0 {
        errors.push(ValidationError::new("retries.max_attempts", "must be at least 1"));
    }
    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if Address::from_str(value.trim()).is_err() {
        errors.push(ValidationError::new(
            field,
            format!("'{}' is not a valid address", value),
        ));
    }
}
