//! Command orchestration.
//!
//! # Responsibilities
//! - Resolve configuration (file, defaults, command-line overrides)
//! - Run the deployment flow in order: secret, artifact, connection,
//!   balance, deploy, verify
//! - Render artifact and network information for the other commands
//!
//! # Design Decisions
//! - Fail fast: the first error aborts the command
//! - The secret is loaded before any network I/O
//! - Results go to stdout, diagnostics to the log

use std::io::Write;
use std::path::Path;

use alloy::hex;
use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use serde_json::{json, Value};
use thiserror::Error;

use crate::blockchain::{BlockchainClient, BlockchainError, Deployer, Deployment, Wallet};
use crate::config::loader::load_or_default;
use crate::config::networks::known_addresses;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, DeployConfig};
use crate::poseidon::verify::verify_deployment;
use crate::poseidon::{create_code, generate_abi, hasher, poseidon_factory, PoseidonError};

/// Top-level error for every command.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),

    #[error(transparent)]
    Poseidon(#[from] PoseidonError),

    #[error("Unknown network '{0}'")]
    UnknownNetwork(String),

    #[error("Invalid value '{0}': expected a decimal or 0x-hex integer")]
    InvalidValue(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub network: Option<String>,
    pub inputs: Option<usize>,
    pub skip_verify: bool,
}

/// Load configuration, apply overrides, then validate.
pub fn resolve_config(path: Option<&Path>, overrides: &Overrides) -> Result<DeployConfig, AppError> {
    let mut config = load_or_default(path)?;

    if let Some(network) = &overrides.network {
        config.network = network.clone();
    }
    if let Some(inputs) = overrides.inputs {
        config.poseidon.inputs = inputs;
    }
    if overrides.skip_verify {
        config.poseidon.verify_after_deploy = false;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Format a wei amount as ether without trailing zeros.
pub fn display_ether(wei: U256) -> String {
    let formatted = format_ether(wei);
    if formatted.contains('.') {
        formatted
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        formatted
    }
}

/// Deploy a Poseidon contract to the selected network.
///
/// The balance line and then the contract address are written to `out`.
pub async fn deploy<W: Write>(config: &DeployConfig, out: &mut W) -> Result<Deployment, AppError> {
    let network = config
        .selected_network()
        .ok_or_else(|| AppError::UnknownNetwork(config.network.clone()))?;
    let n_inputs = config.poseidon.inputs;

    let wallet = Wallet::from_env(&config.deployer.private_key_env, network.chain_id)?;
    let factory = poseidon_factory(n_inputs)?;

    tracing::info!(
        network = %network.name,
        chain_id = network.chain_id,
        n_inputs,
        code_len = factory.bytecode().len(),
        "Deploying Poseidon contract"
    );

    let client = BlockchainClient::connect(network, &wallet, config.deployer.rpc_timeout_secs)?;
    if config.deployer.verify_chain_id {
        client.verify_chain_id().await?;
    }

    let balance = client.get_balance(wallet.address()).await?;
    writeln!(out, "Wallet balance {}", display_ether(balance))?;
    if balance.is_zero() {
        tracing::warn!(address = %wallet.address(), "Wallet has no funds; deployment will likely fail");
    }

    let deployer = Deployer::new(
        client,
        config.deployer.confirmations,
        config.deployer.confirmation_timeout_secs,
    );
    let deployment = deployer.deploy(&factory).await?;
    let code_len = deployer.ensure_code(deployment.address).await?;
    tracing::debug!(code_len, "Runtime code present");

    writeln!(out, "{}", deployment.address)?;
    out.flush()?;

    if config.poseidon.verify_after_deploy {
        verify_deployment(deployer.client(), deployment.address, factory.abi(), n_inputs).await?;
    }

    Ok(deployment)
}

/// Creation bytecode as 0x-prefixed hex.
pub fn bytecode_hex(n_inputs: usize) -> Result<String, AppError> {
    Ok(hex::encode_prefixed(create_code(n_inputs)?))
}

/// ABI as pretty-printed JSON.
pub fn abi_json(n_inputs: usize) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(&generate_abi(n_inputs)?)?)
}

/// Configured networks and well-known addresses.
pub fn networks_json(config: &DeployConfig) -> Result<String, AppError> {
    let addresses: serde_json::Map<String, Value> = known_addresses()
        .iter()
        .map(|(label, addr)| (label.to_string(), Value::from(*addr)))
        .collect();

    let report = json!({
        "selected": config.network,
        "networks": config.networks,
        "addresses": addresses,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Parse a decimal or 0x-hex integer.
pub fn parse_value(s: &str) -> Result<U256, AppError> {
    s.trim()
        .parse::<U256>()
        .map_err(|_| AppError::InvalidValue(s.to_string()))
}

/// Off-chain Poseidon hash of `values`, as 0x-hex.
pub fn hash_values(values: &[String]) -> Result<String, AppError> {
    let inputs = values
        .iter()
        .map(|v| parse_value(v))
        .collect::<Result<Vec<_>, _>>()?;
    let digest = hasher::hash(&inputs)?;
    Ok(hex::encode_prefixed(digest.to_be_bytes::<32>()))
}
