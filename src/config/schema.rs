//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the deployer.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::networks::{builtin_networks, NetworkDescriptor, BSC};

/// Root configuration for the deployer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Key of the network to deploy to.
    pub network: String,

    /// Network table. Entries given in a config file are merged over the
    /// built-in descriptors.
    #[serde(deserialize_with = "merge_with_builtin")]
    pub networks: BTreeMap<String, NetworkDescriptor>,

    /// Signer and transaction settings.
    pub deployer: DeployerConfig,

    /// Poseidon contract settings.
    pub poseidon: PoseidonConfig,

    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: BSC.to_string(),
            networks: builtin_networks(),
            deployer: DeployerConfig::default(),
            poseidon: PoseidonConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DeployConfig {
    /// The descriptor of the selected network, if present.
    pub fn selected_network(&self) -> Option<&NetworkDescriptor> {
        self.networks.get(&self.network)
    }
}

fn merge_with_builtin<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, NetworkDescriptor>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let user = BTreeMap::<String, NetworkDescriptor>::deserialize(deserializer)?;
    let mut networks = builtin_networks();
    networks.extend(user);
    Ok(networks)
}

/// Signer and transaction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeployerConfig {
    /// Environment variable holding the hex private key.
    pub private_key_env: String,

    /// Per-request RPC timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum time to wait for the deployment receipt in seconds.
    pub confirmation_timeout_secs: u64,

    /// Blocks required on top of the deployment block.
    pub confirmations: u64,

    /// Refuse to deploy when the node reports a different chain id.
    pub verify_chain_id: bool,
}

impl Default for DeployerConfig {
    fn default() -> Self {
        Self {
            private_key_env: "userOldSigner".to_string(),
            rpc_timeout_secs: 30,
            confirmation_timeout_secs: 300,
            confirmations: 1,
            verify_chain_id: true,
        }
    }
}

/// Poseidon contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoseidonConfig {
    /// Number of hash inputs (arity) of the deployed contract.
    pub inputs: usize,

    /// Call the contract after deployment and compare with the off-chain hash.
    pub verify_after_deploy: bool,
}

impl Default for PoseidonConfig {
    fn default() -> Self {
        Self {
            inputs: 2,
            verify_after_deploy: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
