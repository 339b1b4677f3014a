//! Poseidon hash contract deployer.
//!
//! Generates circom-compatible Poseidon EVM bytecode and deploys it to a
//! configured network.

pub mod app;
pub mod blockchain;
pub mod config;
pub mod observability;
pub mod poseidon;

pub use app::AppError;
pub use config::schema::DeployConfig;
