//! Minimal EVM assembler.
//!
//! Emits raw opcodes with symbolic jump labels and wraps the result in a
//! loader that returns it as runtime code. Only the instructions needed by
//! the Poseidon generator are exposed.

use std::collections::HashMap;

use alloy::primitives::U256;

use crate::poseidon::PoseidonError;

/// EVM opcodes emitted by the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Div = 0x04,
    AddMod = 0x08,
    MulMod = 0x09,
    Eq = 0x14,
    Or = 0x17,
    CallDataLoad = 0x35,
    CodeSize = 0x38,
    CodeCopy = 0x39,
    Pop = 0x50,
    MLoad = 0x51,
    MStore = 0x52,
    Jump = 0x56,
    JumpI = 0x57,
    JumpDest = 0x5b,
    Push1 = 0x60,
    Dup1 = 0x80,
    Swap1 = 0x90,
    Return = 0xf3,
    Invalid = 0xfe,
}

/// Width of the placeholder pushed for a label that is not yet defined.
const LABEL_PLACEHOLDER_LEN: usize = 3;

/// An EVM program under construction.
#[derive(Debug, Default, Clone)]
pub struct Assembler {
    code: Vec<u8>,
    labels: HashMap<String, usize>,
    /// Label name → offsets of PUSH3 placeholders waiting for it.
    pending: HashMap<String, Vec<usize>>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The runtime code emitted so far.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    fn op(&mut self, op: Opcode) -> &mut Self {
        self.code.push(op as u8);
        self
    }

    /// Push raw big-endian bytes (1..=32) as a PUSHn.
    pub fn push_bytes(&mut self, data: &[u8]) -> Result<&mut Self, PoseidonError> {
        if data.is_empty() || data.len() > 32 {
            return Err(PoseidonError::PushWidth(data.len()));
        }
        self.code.push(Opcode::Push1 as u8 + (data.len() as u8 - 1));
        self.code.extend_from_slice(data);
        Ok(self)
    }

    /// Push an integer using its minimal big-endian encoding.
    ///
    /// Zero is encoded as a single `0x00` byte.
    pub fn push_u256(&mut self, value: U256) -> &mut Self {
        let bytes = value.to_be_bytes::<32>();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(31);
        let data = &bytes[first..];
        self.code.push(Opcode::Push1 as u8 + (data.len() as u8 - 1));
        self.code.extend_from_slice(data);
        self
    }

    pub fn push(&mut self, value: u64) -> &mut Self {
        self.push_u256(U256::from(value))
    }

    /// Push a full 32-byte word regardless of its magnitude.
    pub fn push_word(&mut self, value: U256) -> &mut Self {
        self.code.push(Opcode::Push1 as u8 + 31);
        self.code.extend_from_slice(&value.to_be_bytes::<32>());
        self
    }

    /// Duplicate the stack item at depth `n` (0 = top).
    pub fn dup(&mut self, n: usize) -> Result<&mut Self, PoseidonError> {
        if n >= 16 {
            return Err(PoseidonError::StackDepth { op: "DUP", depth: n });
        }
        self.code.push(Opcode::Dup1 as u8 + n as u8);
        Ok(self)
    }

    /// Swap the top of the stack with the item at depth `n`.
    pub fn swap(&mut self, n: usize) -> Result<&mut Self, PoseidonError> {
        if n == 0 || n > 16 {
            return Err(PoseidonError::StackDepth { op: "SWAP", depth: n });
        }
        self.code.push(Opcode::Swap1 as u8 + (n as u8 - 1));
        Ok(self)
    }

    pub fn div(&mut self) -> &mut Self {
        self.op(Opcode::Div)
    }

    pub fn addmod(&mut self) -> &mut Self {
        self.op(Opcode::AddMod)
    }

    pub fn mulmod(&mut self) -> &mut Self {
        self.op(Opcode::MulMod)
    }

    pub fn eq(&mut self) -> &mut Self {
        self.op(Opcode::Eq)
    }

    pub fn or(&mut self) -> &mut Self {
        self.op(Opcode::Or)
    }

    pub fn calldataload(&mut self) -> &mut Self {
        self.op(Opcode::CallDataLoad)
    }

    pub fn codesize(&mut self) -> &mut Self {
        self.op(Opcode::CodeSize)
    }

    pub fn codecopy(&mut self) -> &mut Self {
        self.op(Opcode::CodeCopy)
    }

    pub fn pop(&mut self) -> &mut Self {
        self.op(Opcode::Pop)
    }

    pub fn mload(&mut self) -> &mut Self {
        self.op(Opcode::MLoad)
    }

    pub fn mstore(&mut self) -> &mut Self {
        self.op(Opcode::MStore)
    }

    pub fn ret(&mut self) -> &mut Self {
        self.op(Opcode::Return)
    }

    pub fn invalid(&mut self) -> &mut Self {
        self.op(Opcode::Invalid)
    }

    /// Define `name` at the current offset and emit a JUMPDEST.
    ///
    /// Any placeholders already emitted for `name` are patched in place.
    pub fn label(&mut self, name: &str) -> Result<&mut Self, PoseidonError> {
        if self.labels.contains_key(name) {
            return Err(PoseidonError::DuplicateLabel(name.to_string()));
        }
        let dest = self.code.len();
        if dest >= 1 << (8 * LABEL_PLACEHOLDER_LEN) {
            return Err(PoseidonError::CodeTooLarge(dest));
        }
        self.labels.insert(name.to_string(), dest);
        self.op(Opcode::JumpDest);

        if let Some(sites) = self.pending.remove(name) {
            let dest_bytes = (dest as u32).to_be_bytes();
            for site in sites {
                self.code[site + 1..site + 1 + LABEL_PLACEHOLDER_LEN]
                    .copy_from_slice(&dest_bytes[4 - LABEL_PLACEHOLDER_LEN..]);
            }
        }
        Ok(self)
    }

    /// Push the offset of `name`, or a placeholder if it is not defined yet.
    pub fn push_label(&mut self, name: &str) -> &mut Self {
        let known = self.labels.get(name).copied();
        match known {
            Some(dest) => self.push(dest as u64),
            None => {
                self.pending
                    .entry(name.to_string())
                    .or_default()
                    .push(self.code.len());
                self.code.push(Opcode::Push1 as u8 + (LABEL_PLACEHOLDER_LEN as u8 - 1));
                self.code.extend_from_slice(&[0u8; LABEL_PLACEHOLDER_LEN]);
                self
            }
        }
    }

    /// JUMP, to `label` if given, else to the address on the stack.
    pub fn jmp(&mut self, label: Option<&str>) -> &mut Self {
        if let Some(name) = label {
            self.push_label(name);
        }
        self.op(Opcode::Jump)
    }

    /// JUMPI, to `label` if given, else to the address on the stack.
    pub fn jmpi(&mut self, label: Option<&str>) -> &mut Self {
        if let Some(name) = label {
            self.push_label(name);
        }
        self.op(Opcode::JumpI)
    }

    /// Build contract creation data: a loader followed by the runtime code.
    ///
    /// The loader copies everything after itself into memory and returns it.
    /// Its own length appears inside it, so it is rebuilt until stable.
    pub fn create_tx_data(&self) -> Result<Vec<u8>, PoseidonError> {
        if !self.pending.is_empty() {
            let mut names: Vec<&str> = self.pending.keys().map(String::as_str).collect();
            names.sort_unstable();
            return Err(PoseidonError::UndefinedLabels(names.join(", ")));
        }

        let mut loader_len = 0usize;
        let loader = loop {
            let mut loader = Assembler::new();
            loader
                .codesize()
                .push(loader_len as u64)
                .push(0)
                .codecopy()
                .push(self.code.len() as u64)
                .push(0)
                .ret();
            if loader.code.len() == loader_len {
                break loader;
            }
            loader_len = loader.code.len();
        };

        let mut data = loader.code;
        data.extend_from_slice(&self.code);
        Ok(data)
    }
}
