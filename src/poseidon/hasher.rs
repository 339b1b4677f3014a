//! Off-chain Poseidon reference over the BN254 scalar field.

use alloy::primitives::U256;
use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};

use crate::poseidon::PoseidonError;

/// The BN254 scalar field modulus `q`.
pub fn field_modulus() -> U256 {
    U256::from_be_slice(&Fr::MODULUS.to_bytes_be())
}

/// Reduce a 256-bit word into the field.
pub fn u256_to_fr(value: &U256) -> Fr {
    Fr::from_be_bytes_mod_order(&value.to_be_bytes::<32>())
}

pub fn fr_to_u256(value: &Fr) -> U256 {
    U256::from_be_slice(&value.into_bigint().to_bytes_be())
}

/// Circom-compatible Poseidon hash of `inputs`.
pub fn hash(inputs: &[U256]) -> Result<U256, PoseidonError> {
    if inputs.is_empty() {
        return Err(PoseidonError::Hash("at least one input is required".to_string()));
    }
    let mut hasher = Poseidon::<Fr>::new_circom(inputs.len())
        .map_err(|e| PoseidonError::Hash(e.to_string()))?;

    let elements: Vec<Fr> = inputs.iter().map(u256_to_fr).collect();
    let digest = hasher
        .hash(&elements)
        .map_err(|e| PoseidonError::Hash(e.to_string()))?;

    Ok(fr_to_u256(&digest))
}
