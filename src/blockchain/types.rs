//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash};
use thiserror::Error;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Deployment receipt did not arrive in time.
    #[error("Transaction {tx_hash} not confirmed: {reason}")]
    Confirmation { tx_hash: TxHash, reason: String },

    /// Transaction was reverted on-chain.
    #[error("Transaction reverted: {0}")]
    Reverted(TxHash),

    /// Receipt of a creation transaction carried no contract address.
    #[error("Receipt for {0} has no contract address")]
    MissingContractAddress(TxHash),

    /// Nothing is deployed at the reported address.
    #[error("No code at {0}")]
    NoCode(Address),

    /// Invalid private key format or missing secret.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Outcome of a confirmed contract deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub address: Address,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}
