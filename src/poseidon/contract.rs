//! Poseidon contract bytecode and ABI.
//!
//! The runtime keeps the permutation state on the stack with the field
//! modulus `q` underneath it:
//!
//! ```text
//! top → st[0], st[1], …, st[t-1], q
//! ```
//!
//! Memory slot 0 holds the return address of the shared MIX subroutine and
//! slots `1 + i*t + j` hold the MDS matrix.

use alloy::json_abi::JsonAbi;
use alloy::primitives::{keccak256, Bytes, U256};
use ark_bn254::Fr;
use light_poseidon::parameters::bn254_x5::get_poseidon_parameters;
use light_poseidon::PoseidonParameters;
use serde_json::{json, Value};

use crate::blockchain::deploy::ContractFactory;
use crate::poseidon::evmasm::Assembler;
use crate::poseidon::hasher::{field_modulus, fr_to_u256};
use crate::poseidon::PoseidonError;

/// Largest supported arity. The MIX step duplicates down to depth
/// `3 + 2(t-1)`, which must stay within DUP16.
pub const MAX_INPUTS: usize = 6;

const MIX_LABEL: &str = "mix";
const START_LABEL: &str = "start";

/// 4-byte function selector of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

pub fn uint_signature(n_inputs: usize) -> String {
    format!("poseidon(uint256[{}])", n_inputs)
}

pub fn bytes_signature(n_inputs: usize) -> String {
    format!("poseidon(bytes32[{}])", n_inputs)
}

fn check_inputs(n_inputs: usize) -> Result<(), PoseidonError> {
    if n_inputs == 0 || n_inputs > MAX_INPUTS {
        return Err(PoseidonError::InvalidInputCount {
            got: n_inputs,
            max: MAX_INPUTS,
        });
    }
    Ok(())
}

fn parameters(width: usize) -> Result<PoseidonParameters<Fr>, PoseidonError> {
    get_poseidon_parameters::<Fr>(width as u8).map_err(|e| PoseidonError::Parameters(e.to_string()))
}

fn matrix_slot(t: usize, i: usize, j: usize) -> u64 {
    ((1 + i * t + j) * 32) as u64
}

struct Generator<'a> {
    asm: Assembler,
    params: &'a PoseidonParameters<Fr>,
    t: usize,
}

impl Generator<'_> {
    fn save_mds(&mut self) {
        let t = self.t;
        for i in 0..t {
            for j in 0..t {
                self.asm
                    .push_word(fr_to_u256(&self.params.mds[i][j]))
                    .push(matrix_slot(t, i, j))
                    .mstore();
            }
        }
    }

    /// st[i] = st[i] + C[r*t + i] mod q
    fn ark(&mut self, round: usize) -> Result<(), PoseidonError> {
        let t = self.t;
        for i in 0..t {
            let constant = fr_to_u256(&self.params.ark[round * t + i]);
            self.asm.dup(t)?;
            self.asm.push_word(constant);
            self.asm.dup(2 + i)?;
            self.asm.addmod();
            self.asm.swap(1 + i)?;
            self.asm.pop();
        }
        Ok(())
    }

    /// st[p] = st[p]^5 mod q
    fn sigma(&mut self, p: usize) -> Result<(), PoseidonError> {
        let t = self.t;
        self.asm.dup(t)?; // q, st, q
        self.asm.dup(1 + p)?; // x, q, st, q
        self.asm.dup(1)?; // q, x, q, st, q
        self.asm.dup(0)?; // q, q, x, q, st, q
        self.asm.dup(2)?; // x, q, q, x, q, st, q
        self.asm.dup(0)?; // x, x, q, q, x, q, st, q
        self.asm.mulmod(); // x2, q, x, q, st, q
        self.asm.dup(0)?; // x2, x2, q, x, q, st, q
        self.asm.mulmod(); // x4, x, q, st, q
        self.asm.mulmod(); // x5, st, q
        self.asm.swap(1 + p)?;
        self.asm.pop();
        Ok(())
    }

    /// Shared MDS multiplication; returns to the address in memory slot 0.
    fn mix(&mut self) -> Result<(), PoseidonError> {
        let t = self.t;
        self.asm.label(MIX_LABEL)?;
        for i in 0..t {
            for j in 0..t {
                if j == 0 {
                    self.asm.dup(i + t)?; // q, new, old, q
                    self.asm.push(matrix_slot(t, i, j)).mload();
                    self.asm.dup(2 + i + j)?; // old[j], M, q, new, old, q
                    self.asm.mulmod(); // acc, new, old, q
                } else {
                    self.asm.dup(1 + i + t)?; // q, acc, new, old, q
                    self.asm.push(matrix_slot(t, i, j)).mload();
                    self.asm.dup(3 + i + j)?; // old[j], M, q, acc, new, old, q
                    self.asm.mulmod(); // aux, acc, new, old, q
                    self.asm.dup(2 + i + t)?; // q, aux, acc, new, old, q
                    self.asm.swap(2)?; // acc, aux, q, new, old, q
                    self.asm.addmod(); // acc, new, old, q
                }
            }
        }
        // Overwrite the old state with the new one, keeping st[0] on top.
        for i in 0..t {
            self.asm.swap((t - i) + (t - i - 1))?;
            self.asm.pop();
        }
        self.asm.push(0).mload();
        self.asm.jmp(None);
        Ok(())
    }

    fn selector_dispatch(&mut self, n_inputs: usize) -> Result<(), PoseidonError> {
        self.asm
            .push_u256(U256::from(1) << 224)
            .push(0)
            .calldataload()
            .div();
        self.asm.dup(0)?;
        self.asm.push_bytes(&selector(&uint_signature(n_inputs)))?;
        self.asm.eq();
        self.asm.swap(1)?;
        self.asm.push_bytes(&selector(&bytes_signature(n_inputs)))?;
        self.asm.eq().or().jmpi(Some(START_LABEL)).invalid();
        Ok(())
    }

    fn generate(mut self, n_inputs: usize) -> Result<Vec<u8>, PoseidonError> {
        let t = self.t;
        let full = self.params.full_rounds;
        let partial = self.params.partial_rounds;

        self.selector_dispatch(n_inputs)?;
        self.asm.label(START_LABEL)?;
        self.save_mds();
        self.asm.push_u256(field_modulus());

        // Calldata is [selector][in_0][in_1]…; in_0 ends on top, above the
        // zero capacity lane.
        for i in 0..n_inputs {
            self.asm
                .push((0x04 + 0x20 * (n_inputs - i - 1)) as u64)
                .calldataload();
        }
        self.asm.push(0);

        for round in 0..full + partial {
            self.ark(round)?;
            if round < full / 2 || round >= partial + full / 2 {
                for p in 0..t {
                    self.sigma(p)?;
                }
            } else {
                self.sigma(0)?;
            }
            let after = format!("afterMix{}", round);
            self.asm.push_label(&after).push(0).mstore();
            self.asm.jmp(Some(MIX_LABEL));
            self.asm.label(&after)?;
        }

        self.asm.push(0).mstore();
        self.asm.push(0x20).push(0).ret();

        self.mix()?;

        self.asm.create_tx_data()
    }
}

/// Contract creation bytecode for a Poseidon hasher of `n_inputs` inputs.
pub fn create_code(n_inputs: usize) -> Result<Vec<u8>, PoseidonError> {
    check_inputs(n_inputs)?;
    let t = n_inputs + 1;
    let params = parameters(t)?;

    let generator = Generator {
        asm: Assembler::new(),
        params: &params,
        t,
    };
    let code = generator.generate(n_inputs)?;

    tracing::debug!(
        n_inputs,
        full_rounds = params.full_rounds,
        partial_rounds = params.partial_rounds,
        code_len = code.len(),
        "Generated Poseidon bytecode"
    );
    Ok(code)
}

/// JSON ABI with the `bytes32[n]` and `uint256[n]` overloads of `poseidon`.
pub fn generate_abi(n_inputs: usize) -> Result<Value, PoseidonError> {
    check_inputs(n_inputs)?;

    let function = |ty: &str, out: &str| {
        let arr = format!("{}[{}]", ty, n_inputs);
        json!({
            "constant": true,
            "inputs": [{ "internalType": arr, "name": "input", "type": arr }],
            "name": "poseidon",
            "outputs": [{ "internalType": out, "name": "", "type": out }],
            "payable": false,
            "stateMutability": "pure",
            "type": "function"
        })
    };

    Ok(Value::Array(vec![
        function("bytes32", "bytes32"),
        function("uint256", "uint256"),
    ]))
}

/// Parsed form of [`generate_abi`].
pub fn abi(n_inputs: usize) -> Result<JsonAbi, PoseidonError> {
    serde_json::from_value(generate_abi(n_inputs)?).map_err(|e| PoseidonError::Abi(e.to_string()))
}

/// Deployable artifact for a Poseidon hasher of `n_inputs` inputs.
pub fn poseidon_factory(n_inputs: usize) -> Result<ContractFactory, PoseidonError> {
    let bytecode = Bytes::from(create_code(n_inputs)?);
    let abi = abi(n_inputs)?;
    Ok(ContractFactory::new(abi, bytecode))
}
