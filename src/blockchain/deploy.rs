//! Contract deployment and confirmation.
//!
//! # Responsibilities
//! - Build the contract-creation transaction from a factory
//! - Sign and broadcast it through the client's filler stack
//! - Wait for the receipt with the configured confirmations
//! - Check the contract actually landed on-chain

use alloy::json_abi::JsonAbi;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::TransactionRequest;
use std::time::Duration;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, Deployment};

/// Deployable contract: ABI plus creation bytecode.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    abi: JsonAbi,
    bytecode: Bytes,
}

impl ContractFactory {
    pub fn new(abi: JsonAbi, bytecode: Bytes) -> Self {
        Self { abi, bytecode }
    }

    pub fn abi(&self) -> &JsonAbi {
        &self.abi
    }

    pub fn bytecode(&self) -> &Bytes {
        &self.bytecode
    }

    /// Unsigned creation transaction. Nonce, gas and fees are left to the
    /// provider's fillers.
    pub fn deploy_tx(&self) -> TransactionRequest {
        TransactionRequest::default().with_deploy_code(self.bytecode.clone())
    }
}

/// Sends creation transactions and waits for them to confirm.
pub struct Deployer {
    client: BlockchainClient,
    confirmations: u64,
    confirmation_timeout: Duration,
}

impl Deployer {
    /// Create a deployer.
    ///
    /// # Arguments
    /// * `client` - Signer-bound client
    /// * `confirmations` - Blocks required for the receipt (at least 1)
    /// * `confirmation_timeout_secs` - Maximum time to wait for the receipt
    pub fn new(client: BlockchainClient, confirmations: u64, confirmation_timeout_secs: u64) -> Self {
        Self {
            client,
            confirmations: confirmations.max(1),
            confirmation_timeout: Duration::from_secs(confirmation_timeout_secs),
        }
    }

    /// Deploy `factory` and wait for its receipt.
    pub async fn deploy(&self, factory: &ContractFactory) -> BlockchainResult<Deployment> {
        let tx = factory.deploy_tx();

        let pending = self
            .client
            .rpc("eth_sendRawTransaction", self.client.provider().send_transaction(tx))
            .await?;
        let tx_hash = *pending.tx_hash();

        tracing::info!(
            tx_hash = %tx_hash,
            code_len = factory.bytecode().len(),
            confirmations = self.confirmations,
            "Deployment transaction sent"
        );

        let receipt = pending
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.confirmation_timeout))
            .get_receipt()
            .await
            .map_err(|e| BlockchainError::Confirmation {
                tx_hash,
                reason: e.to_string(),
            })?;

        if !receipt.status() {
            return Err(BlockchainError::Reverted(tx_hash));
        }

        let address = receipt
            .contract_address
            .ok_or(BlockchainError::MissingContractAddress(tx_hash))?;

        let deployment = Deployment {
            address,
            tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        };

        tracing::info!(
            address = %deployment.address,
            block_number = ?deployment.block_number,
            gas_used = deployment.gas_used,
            "Contract deployed"
        );
        Ok(deployment)
    }

    /// Ensure runtime code exists at `address`; returns its length.
    pub async fn ensure_code(&self, address: Address) -> BlockchainResult<usize> {
        let code = self.client.get_code(address).await?;
        if code.is_empty() {
            return Err(BlockchainError::NoCode(address));
        }
        Ok(code.len())
    }

    pub fn client(&self) -> &BlockchainClient {
        &self.client
    }
}
