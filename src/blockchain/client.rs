//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect a signer-bound provider to the JSON-RPC endpoint
//! - Query chain state (chain id, balances, code)
//! - Execute read-only calls
//! - Handle timeouts and network errors gracefully

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId};
use crate::blockchain::wallet::Wallet;
use crate::config::NetworkDescriptor;

/// Blockchain RPC client bound to one network and one signer.
#[derive(Clone)]
pub struct BlockchainClient {
    /// Provider with nonce, gas and signing fillers.
    provider: Arc<dyn Provider + Send + Sync>,
    /// Network this client talks to.
    network: NetworkDescriptor,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a client for `network` that signs with `wallet`.
    ///
    /// The wallet must be bound to the network's chain id. No request is
    /// made here; connectivity surfaces on the first call.
    pub fn connect(
        network: &NetworkDescriptor,
        wallet: &Wallet,
        rpc_timeout_secs: u64,
    ) -> BlockchainResult<Self> {
        if wallet.chain_id() != network.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: network.chain_id,
                actual: wallet.chain_id(),
            });
        }

        let url = network.rpc_url().map_err(|e| {
            BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", network.url, e))
        })?;

        let provider = ProviderBuilder::new()
            .wallet(wallet.ethereum_wallet())
            .connect_http(url);

        tracing::info!(
            network = %network.name,
            chain_id = network.chain_id,
            "Blockchain client initialized"
        );

        Ok(Self {
            provider: Arc::new(provider) as Arc<dyn Provider + Send + Sync>,
            network: network.clone(),
            timeout_duration: Duration::from_secs(rpc_timeout_secs),
        })
    }

    /// Await an RPC future under the configured timeout.
    pub(crate) async fn rpc<F, T, E>(&self, method: &'static str, fut: F) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(method, error = %e, "RPC error");
                Err(BlockchainError::Rpc(format!("{} failed: {}", method, e)))
            }
            Err(_) => {
                tracing::warn!(method, "RPC timeout");
                Err(BlockchainError::Timeout(self.timeout_duration.as_secs()))
            }
        }
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.rpc("eth_chainId", self.provider.get_chain_id())
            .await
            .map(ChainId)
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != self.network.chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: self.network.chain_id,
                actual: chain_id.0,
            });
        }
        tracing::debug!(chain_id = chain_id.0, "Chain ID verified");
        Ok(())
    }

    /// Get the balance of an address in wei.
    pub async fn get_balance(&self, address: Address) -> BlockchainResult<U256> {
        self.rpc("eth_getBalance", self.provider.get_balance(address))
            .await
    }

    /// Get the runtime code deployed at an address.
    pub async fn get_code(&self, address: Address) -> BlockchainResult<Bytes> {
        self.rpc("eth_getCode", self.provider.get_code_at(address))
            .await
    }

    /// Execute a read-only call against `to`.
    pub async fn call(&self, to: Address, calldata: Bytes) -> BlockchainResult<Bytes> {
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata);
        self.rpc("eth_call", self.provider.call(tx)).await
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &(dyn Provider + Send + Sync) {
        self.provider.as_ref()
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("network", &self.network.name)
            .field("chain_id", &self.network.chain_id)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
