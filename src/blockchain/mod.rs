//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables / .env (private key)
//!     → wallet.rs (key loading)
//!     → client.rs (signer-bound RPC connection with timeouts)
//!     → deploy.rs (build, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod deploy;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use deploy::{ContractFactory, Deployer};
pub use types::{BlockchainError, BlockchainResult, ChainId, Deployment};
pub use wallet::Wallet;
