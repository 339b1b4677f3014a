//! Poseidon contract deployer (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI args ──▶ config ──▶ wallet (env secret)
//!                  │            │
//!                  ▼            ▼
//!              poseidon ──▶ blockchain client ──▶ RPC endpoint
//!           (bytecode+ABI)      │
//!                               ▼
//!                     deploy ──▶ verify ──▶ stdout: balance, address
//! ```
//!
//! Any error is logged and the process exits with status 1.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use poseidon_deployer::app::{self, AppError, Overrides};
use poseidon_deployer::config::LoggingConfig;
use poseidon_deployer::observability::init_logging;

#[derive(Parser)]
#[command(name = "poseidon-deployer", version)]
#[command(about = "Generate and deploy Poseidon hash contracts", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network key to target (e.g. bsc, goerli).
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// Log filter, overridden by RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a Poseidon contract (default)
    Deploy {
        /// Number of hash inputs.
        #[arg(short, long)]
        inputs: Option<usize>,

        /// Skip the post-deployment hash check.
        #[arg(long)]
        no_verify: bool,
    },
    /// Print contract creation bytecode
    Bytecode {
        #[arg(short, long)]
        inputs: Option<usize>,
    },
    /// Print the contract ABI
    Abi {
        #[arg(short, long)]
        inputs: Option<usize>,
    },
    /// List configured networks and well-known addresses
    Networks,
    /// Compute a Poseidon hash off-chain
    Hash {
        /// Decimal or 0x-hex field elements.
        #[arg(required = true)]
        values: Vec<String>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let mut overrides = Overrides {
            network: self.network.clone(),
            ..Default::default()
        };
        match &self.command {
            Some(Commands::Deploy { inputs, no_verify }) => {
                overrides.inputs = *inputs;
                overrides.skip_verify = *no_verify;
            }
            Some(Commands::Bytecode { inputs }) | Some(Commands::Abi { inputs }) => {
                overrides.inputs = *inputs;
            }
            _ => {}
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match app::resolve_config(cli.config.as_deref(), &cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&LoggingConfig::default(), cli.log_level.as_deref());
            return report(e);
        }
    };
    init_logging(&config.logging, cli.log_level.as_deref());

    tracing::debug!(network = %config.network, "Configuration loaded");

    let mut out = std::io::stdout().lock();
    let result = match cli.command {
        None | Some(Commands::Deploy { .. }) => app::deploy(&config, &mut out).await.map(|_| ()),
        Some(Commands::Bytecode { .. }) => app::bytecode_hex(config.poseidon.inputs)
            .and_then(|code| emit(&mut out, &code)),
        Some(Commands::Abi { .. }) => {
            app::abi_json(config.poseidon.inputs).and_then(|abi| emit(&mut out, &abi))
        }
        Some(Commands::Networks) => {
            app::networks_json(&config).and_then(|report| emit(&mut out, &report))
        }
        Some(Commands::Hash { values }) => {
            app::hash_values(&values).and_then(|digest| emit(&mut out, &digest))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

/// Write one result line; a closed stdout is an error, not a panic.
fn emit<W: Write>(out: &mut W, line: &str) -> Result<(), AppError> {
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

fn report(error: AppError) -> ExitCode {
    tracing::error!(error = %error, "Command failed");
    eprintln!("Error: {}", error);
    ExitCode::FAILURE
}
