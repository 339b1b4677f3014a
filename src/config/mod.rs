//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, merge networks over built-ins)
//!     → command-line overrides (network, arity)
//!     → validation.rs (semantic checks)
//!     → DeployConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults, so running without a file targets BSC testnet
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets never live in config; only the name of the env var does

pub mod loader;
pub mod networks;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use networks::NetworkDescriptor;
pub use schema::{DeployConfig, DeployerConfig, LogFormat, LoggingConfig, PoseidonConfig};
