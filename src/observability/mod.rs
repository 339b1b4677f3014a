//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!
//! Consumers:
//!     → stderr (pretty for terminals, JSON for log aggregation)
//! ```
//!
//! # Design Decisions
//! - Structured fields (address, tx_hash, chain_id) instead of formatted text
//! - Secrets are never passed to log macros

pub mod logging;

pub use logging::init_logging;
