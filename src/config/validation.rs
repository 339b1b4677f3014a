//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the selected network exists
//! - Validate endpoints, chain ids and infrastructure addresses
//! - Validate value ranges (arity, timeouts)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DeployConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::networks::{parse_address, NetworkDescriptor};
use crate::config::schema::DeployConfig;
use crate::poseidon::contract::MAX_INPUTS;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a deploy configuration, collecting every error.
pub fn validate_config(config: &DeployConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.selected_network().is_none() {
        let known: Vec<&str> = config.networks.keys().map(String::as_str).collect();
        errors.push(ValidationError::new(
            "network",
            format!(
                "unknown network '{}' (known: {})",
                config.network,
                known.join(", ")
            ),
        ));
    }

    for (key, network) in &config.networks {
        validate_network(key, network, &mut errors);
    }

    let inputs = config.poseidon.inputs;
    if inputs == 0 || inputs > MAX_INPUTS {
        errors.push(ValidationError::new(
            "poseidon.inputs",
            format!("must be between 1 and {}, got {}", MAX_INPUTS, inputs),
        ));
    }

    if config.deployer.private_key_env.trim().is_empty() {
        errors.push(ValidationError::new(
            "deployer.private_key_env",
            "must name an environment variable",
        ));
    }
    if config.deployer.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "deployer.rpc_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.deployer.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "deployer.confirmation_timeout_secs",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one network descriptor.
pub fn validate_network(key: &str, network: &NetworkDescriptor, errors: &mut Vec<ValidationError>) {
    let field = |name: &str| format!("networks.{}.{}", key, name);

    match network.rpc_url() {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field("url"),
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            field("url"),
            format!("invalid URL '{}': {}", network.url, e),
        )),
    }

    if network.chain_id == 0 {
        errors.push(ValidationError::new(field("chain_id"), "must be positive"));
    }

    if network.name.trim().is_empty() {
        errors.push(ValidationError::new(field("name"), "must not be empty"));
    }

    if let Err(e) = parse_address(&network.gateway) {
        errors.push(ValidationError::new(field("gateway"), e));
    }
    if let Err(e) = parse_address(&network.gas_service) {
        errors.push(ValidationError::new(field("gas_service"), e));
    }
}
