//! Poseidon hash contract generation.
//!
//! # Data Flow
//! ```text
//! arity n
//!     → contract.rs (round constants + MDS from light-poseidon)
//!     → evmasm.rs (assemble runtime code, wrap in loader)
//!     → creation bytecode + JSON ABI
//!
//! after deployment:
//!     verify.rs (eth_call) ⇄ hasher.rs (off-chain reference)
//! ```
//!
//! # Design Decisions
//! - Bytecode layout follows the circom reference generator exactly, so
//!   deployed contracts are interchangeable with ones built by circomlib
//! - Constants are taken from light-poseidon rather than embedded here

pub mod contract;
pub mod evmasm;
pub mod hasher;
pub mod verify;

use alloy::primitives::U256;
use thiserror::Error;

use crate::blockchain::BlockchainError;

pub use contract::{create_code, generate_abi, poseidon_factory, MAX_INPUTS};
pub use evmasm::Assembler;

/// Errors raised while generating, hashing or verifying Poseidon contracts.
#[derive(Debug, Error)]
pub enum PoseidonError {
    /// Arity outside the range the generator supports.
    #[error("invalid number of inputs {got}: must be between 1 and {max}")]
    InvalidInputCount { got: usize, max: usize },

    /// Round constants could not be produced for the requested width.
    #[error("poseidon parameters unavailable: {0}")]
    Parameters(String),

    /// Off-chain hashing failed.
    #[error("poseidon hash failed: {0}")]
    Hash(String),

    #[error("push data must be 1 to 32 bytes, got {0}")]
    PushWidth(usize),

    #[error("{op} depth {depth} out of range")]
    StackDepth { op: &'static str, depth: usize },

    #[error("label '{0}' defined twice")]
    DuplicateLabel(String),

    #[error("labels not defined: {0}")]
    UndefinedLabels(String),

    #[error("code offset {0} does not fit a jump label")]
    CodeTooLarge(usize),

    /// Generated ABI was rejected by the ABI parser.
    #[error("invalid ABI: {0}")]
    Abi(String),

    /// The deployed contract disagrees with the off-chain hash.
    #[error("on-chain hash {actual:#x} does not match off-chain hash {expected:#x}")]
    VerificationMismatch { expected: U256, actual: U256 },

    #[error(transparent)]
    Blockchain(#[from] BlockchainError),
}
