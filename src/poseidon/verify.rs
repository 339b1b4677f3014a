//! Post-deployment check: the on-chain hash must equal the off-chain one.

use alloy::json_abi::JsonAbi;
use alloy::primitives::{Address, Bytes, U256};

use crate::blockchain::BlockchainClient;
use crate::poseidon::{hasher, PoseidonError};

/// Inputs used to probe a deployed contract: `[1, 2, …, n]`.
pub fn sample_inputs(n_inputs: usize) -> Vec<U256> {
    (1..=n_inputs as u64).map(U256::from).collect()
}

/// ABI-encode a call to the `uint256[n]` overload of `poseidon`.
pub fn encode_call(abi: &JsonAbi, inputs: &[U256]) -> Result<Bytes, PoseidonError> {
    let ty = format!("uint256[{}]", inputs.len());
    let function = abi
        .functions
        .get("poseidon")
        .and_then(|overloads| {
            overloads
                .iter()
                .find(|f| f.inputs.len() == 1 && f.inputs[0].ty == ty)
        })
        .ok_or_else(|| PoseidonError::Abi(format!("no poseidon({}) in ABI", ty)))?;

    let mut data = function.selector().to_vec();
    for input in inputs {
        data.extend_from_slice(&input.to_be_bytes::<32>());
    }
    Ok(data.into())
}

/// Decode the single 32-byte word returned by `poseidon`.
pub fn decode_output(output: &[u8]) -> Result<U256, PoseidonError> {
    if output.len() < 32 {
        return Err(PoseidonError::Abi(format!(
            "expected 32 bytes of return data, got {}",
            output.len()
        )));
    }
    Ok(U256::from_be_slice(&output[..32]))
}

/// Call the contract at `address` and compare with the off-chain hash.
///
/// Returns the verified digest.
pub async fn verify_deployment(
    client: &BlockchainClient,
    address: Address,
    abi: &JsonAbi,
    n_inputs: usize,
) -> Result<U256, PoseidonError> {
    let inputs = sample_inputs(n_inputs);
    let expected = hasher::hash(&inputs)?;

    let calldata = encode_call(abi, &inputs)?;
    let output = client.call(address, calldata).await?;
    let actual = decode_output(&output)?;

    if actual != expected {
        return Err(PoseidonError::VerificationMismatch { expected, actual });
    }

    tracing::info!(%address, digest = %format!("{:#x}", actual), "On-chain hash verified");
    Ok(actual)
}
