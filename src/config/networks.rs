//! Built-in network descriptors and well-known addresses.
//!
//! These are the two testnets the deployer targets out of the box. The
//! gateway and gas-service contracts are external infrastructure; they are
//! carried as configuration and never called by the deployment flow.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Poseidon contract deployed on the Ethereum testnet.
pub const POSEIDON_ADDR: &str = "0x90543074042965ACAB09eFCE96CBF5CfFeA1a4f5";
/// Sender account on the Ethereum testnet.
pub const SENDER_ADDR: &str = "0x9191Bab59eEB4b42A5ECad2Dd042e79Dec76E14E";

/// Poseidon contract deployed on BSC testnet.
pub const POSEIDON_BSC: &str = "0x90543074042965ACAB09eFCE96CBF5CfFeA1a4f5";
/// Receiver account on BSC testnet.
pub const RECEIVER_BSC: &str = "0x9191Bab59eEB4b42A5ECad2Dd042e79Dec76E14E";

/// Key of the Goerli descriptor in the network table.
pub const GOERLI: &str = "goerli";
/// Key of the BSC testnet descriptor in the network table.
pub const BSC: &str = "bsc";

/// A blockchain network the deployer can target.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkDescriptor {
    /// JSON-RPC endpoint.
    pub url: String,

    /// EIP-155 chain identifier.
    pub chain_id: u64,

    /// Gateway contract address.
    pub gateway: String,

    /// Gas-service contract address.
    #[serde(alias = "gasservice")]
    pub gas_service: String,

    /// Human-readable network name.
    pub name: String,
}

impl NetworkDescriptor {
    /// Parse the endpoint into a URL.
    pub fn rpc_url(&self) -> Result<url::Url, url::ParseError> {
        self.url.parse()
    }

    pub fn goerli() -> Self {
        Self {
            url: "https://eth-goerli.g.alchemy.com/v2/wQZhZrGooqQlJMi44xtV3WQEAlhY8Ycz"
                .to_string(),
            chain_id: 5,
            gateway: "0xe432150cce91c13a887f7D836923d5597adD8E31".to_string(),
            gas_service: "0xbE406F0189A0B4cf3A05C286473D23791Dd44Cc6".to_string(),
            name: "ethereum-2".to_string(),
        }
    }

    pub fn bsc_testnet() -> Self {
        Self {
            url: "https://bsc-testnet.publicnode.com".to_string(),
            chain_id: 97,
            gateway: "0x4D147dCb984e6affEEC47e44293DA442580A3Ec0".to_string(),
            gas_service: "0xbE406F0189A0B4cf3A05C286473D23791Dd44Cc6".to_string(),
            name: "binance".to_string(),
        }
    }
}

/// The built-in network table, keyed by short name.
pub fn builtin_networks() -> BTreeMap<String, NetworkDescriptor> {
    BTreeMap::from([
        (GOERLI.to_string(), NetworkDescriptor::goerli()),
        (BSC.to_string(), NetworkDescriptor::bsc_testnet()),
    ])
}

/// Parse a 0x-prefixed hex address.
///
/// Mixed-case input is accepted without enforcing the EIP-55 checksum.
pub fn parse_address(s: &str) -> Result<Address, String> {
    if !s.starts_with("0x") {
        return Err(format!("address '{}' is missing the 0x prefix", s));
    }
    s.parse::<Address>()
        .map_err(|e| format!("invalid address '{}': {}", s, e))
}

/// Well-known addresses as (label, value) pairs, for display.
pub fn known_addresses() -> [(&'static str, &'static str); 4] {
    [
        ("poseidon", POSEIDON_ADDR),
        ("sender", SENDER_ADDR),
        ("poseidon_bsc", POSEIDON_BSC),
        ("receiver_bsc", RECEIVER_BSC),
    ]
}
