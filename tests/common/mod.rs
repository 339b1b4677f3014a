//! Shared utilities for integration testing.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::Command;
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes, U256};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[allow(dead_code)]
const MAX_STEPS: usize = 5_000_000;
#[allow(dead_code)]
const MAX_STACK: usize = 1024;

/// Why execution stopped without returning data.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Invalid(usize),
    BadJump(usize),
    StackUnderflow(usize),
    StackOverflow(usize),
    Unsupported(u8, usize),
    OutOfSteps,
}

/// Interpreter for the opcode subset emitted by the Poseidon generator.
#[allow(dead_code)]
pub struct MiniEvm<'a> {
    code: &'a [u8],
    calldata: &'a [u8],
    stack: Vec<U256>,
    memory: Vec<u8>,
    jumpdests: HashSet<usize>,
}

#[allow(dead_code)]
impl<'a> MiniEvm<'a> {
    pub fn new(code: &'a [u8], calldata: &'a [u8]) -> Self {
        let mut jumpdests = HashSet::new();
        let mut pc = 0;
        while pc < code.len() {
            let op = code[pc];
            if op == 0x5b {
                jumpdests.insert(pc);
            }
            pc += if (0x60..=0x7f).contains(&op) { (op - 0x5f) as usize + 1 } else { 1 };
        }
        Self {
            code,
            calldata,
            stack: Vec::new(),
            memory: Vec::new(),
            jumpdests,
        }
    }

    fn pop(&mut self, pc: usize) -> Result<U256, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow(pc))
    }

    fn push(&mut self, value: U256, pc: usize) -> Result<(), Fault> {
        if self.stack.len() >= MAX_STACK {
            return Err(Fault::StackOverflow(pc));
        }
        self.stack.push(value);
        Ok(())
    }

    fn expand(&mut self, end: usize) {
        if self.memory.len() < end {
            let words = end.div_ceil(32);
            self.memory.resize(words * 32, 0);
        }
    }

    pub fn run(mut self) -> Result<Vec<u8>, Fault> {
        let mut pc = 0;
        for _ in 0..MAX_STEPS {
            if pc >= self.code.len() {
                return Ok(Vec::new());
            }
            let op = self.code[pc];
            match op {
                0x04 => {
                    let a = self.pop(pc)?;
                    let b = self.pop(pc)?;
                    let r = if b.is_zero() { U256::ZERO } else { a / b };
                    self.push(r, pc)?;
                }
                0x08 | 0x09 => {
                    let a = self.pop(pc)?;
                    let b = self.pop(pc)?;
                    let n = self.pop(pc)?;
                    let r = if n.is_zero() {
                        U256::ZERO
                    } else if op == 0x08 {
                        a.add_mod(b, n)
                    } else {
                        a.mul_mod(b, n)
                    };
                    self.push(r, pc)?;
                }
                0x14 => {
                    let a = self.pop(pc)?;
                    let b = self.pop(pc)?;
                    let r = if a == b { U256::from(1) } else { U256::ZERO };
                    self.push(r, pc)?;
                }
                0x17 => {
                    let a = self.pop(pc)?;
                    let b = self.pop(pc)?;
                    self.push(a | b, pc)?;
                }
                0x35 => {
                    let offset = self.pop(pc)?.to::<usize>();
                    let mut word = [0u8; 32];
                    for (i, byte) in word.iter_mut().enumerate() {
                        *byte = self.calldata.get(offset + i).copied().unwrap_or(0);
                    }
                    self.push(U256::from_be_bytes(word), pc)?;
                }
                0x38 => {
                    let size = U256::from(self.code.len());
                    self.push(size, pc)?;
                }
                0x39 => {
                    let dest = self.pop(pc)?.to::<usize>();
                    let offset = self.pop(pc)?.to::<usize>();
                    let len = self.pop(pc)?.to::<usize>();
                    self.expand(dest + len);
                    for i in 0..len {
                        self.memory[dest + i] = self.code.get(offset + i).copied().unwrap_or(0);
                    }
                }
                0x50 => {
                    self.pop(pc)?;
                }
                0x51 => {
                    let offset = self.pop(pc)?.to::<usize>();
                    self.expand(offset + 32);
                    let value = U256::from_be_slice(&self.memory[offset..offset + 32]);
                    self.push(value, pc)?;
                }
                0x52 => {
                    let offset = self.pop(pc)?.to::<usize>();
                    let value = self.pop(pc)?;
                    self.expand(offset + 32);
                    self.memory[offset..offset + 32].copy_from_slice(&value.to_be_bytes::<32>());
                }
                0x56 => {
                    let dest = self.pop(pc)?.to::<usize>();
                    if !self.jumpdests.contains(&dest) {
                        return Err(Fault::BadJump(pc));
                    }
                    pc = dest;
                    continue;
                }
                0x57 => {
                    let dest = self.pop(pc)?.to::<usize>();
                    let cond = self.pop(pc)?;
                    if !cond.is_zero() {
                        if !self.jumpdests.contains(&dest) {
                            return Err(Fault::BadJump(pc));
                        }
                        pc = dest;
                        continue;
                    }
                }
                0x5b => {}
                0x60..=0x7f => {
                    let len = (op - 0x5f) as usize;
                    let start = pc + 1;
                    let mut word = [0u8; 32];
                    for i in 0..len {
                        word[32 - len + i] = self.code.get(start + i).copied().unwrap_or(0);
                    }
                    self.push(U256::from_be_bytes(word), pc)?;
                    pc += len;
                }
                0x80..=0x8f => {
                    let depth = (op - 0x80) as usize;
                    if depth >= self.stack.len() {
                        return Err(Fault::StackUnderflow(pc));
                    }
                    let value = self.stack[self.stack.len() - 1 - depth];
                    self.push(value, pc)?;
                }
                0x90..=0x9f => {
                    let depth = (op - 0x8f) as usize;
                    if depth >= self.stack.len() {
                        return Err(Fault::StackUnderflow(pc));
                    }
                    let top = self.stack.len() - 1;
                    self.stack.swap(top, top - depth);
                }
                0xf3 => {
                    let offset = self.pop(pc)?.to::<usize>();
                    let len = self.pop(pc)?.to::<usize>();
                    self.expand(offset + len);
                    return Ok(self.memory[offset..offset + len].to_vec());
                }
                0xfe => return Err(Fault::Invalid(pc)),
                other => return Err(Fault::Unsupported(other, pc)),
            }
            pc += 1;
        }
        Err(Fault::OutOfSteps)
    }
}

/// Run creation code and return the runtime code it deploys.
#[allow(dead_code)]
pub fn deploy(creation_code: &[u8]) -> Result<Vec<u8>, Fault> {
    MiniEvm::new(creation_code, &[]).run()
}

/// Call runtime code with `calldata` and return its output.
#[allow(dead_code)]
pub fn call(runtime_code: &[u8], calldata: &[u8]) -> Result<Vec<u8>, Fault> {
    MiniEvm::new(runtime_code, calldata).run()
}

/// Calldata for a fixed-size array argument of 32-byte words.
#[allow(dead_code)]
pub fn encode_words(selector: [u8; 4], words: &[U256]) -> Vec<u8> {
    let mut data = selector.to_vec();
    for word in words {
        data.extend_from_slice(&word.to_be_bytes::<32>());
    }
    data
}

/// Command for the built deployer binary with a clean environment.
#[allow(dead_code)]
pub fn deployer_command() -> Command {
    let mut cmd = Command::new(PathBuf::from(env!("CARGO_BIN_EXE_poseidon-deployer")));
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Transaction hash returned for every `eth_sendRawTransaction`.
#[allow(dead_code)]
pub const MOCK_TX_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";

/// Scripted chain state served by [`start_rpc_backend`].
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct MockChain {
    pub chain_id: u64,
    pub balance: U256,
    pub receipt_status: bool,
    pub contract_address: Option<Address>,
    pub code: Bytes,
    pub call_result: Bytes,
}

#[allow(dead_code)]
impl MockChain {
    /// A chain on which a deployment to `address` succeeds.
    pub fn deploying_to(chain_id: u64, address: Address) -> Self {
        Self {
            chain_id,
            balance: U256::from(1_500_000_000_000_000_000u64),
            receipt_status: true,
            contract_address: Some(address),
            code: Bytes::from_static(&[0x60, 0x00]),
            call_result: Bytes::new(),
        }
    }

    fn receipt(&self) -> Value {
        json!({
            "transactionHash": MOCK_TX_HASH,
            "transactionIndex": "0x0",
            "blockHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "from": "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
            "to": null,
            "contractAddress": self.contract_address,
            "cumulativeGasUsed": "0x7a120",
            "gasUsed": "0x7a120",
            "effectiveGasPrice": "0x3b9aca00",
            "logs": [],
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "status": if self.receipt_status { "0x1" } else { "0x0" },
            "type": "0x2"
        })
    }

    fn answer(&self, method: &str) -> Result<Value, String> {
        let result = match method {
            "eth_chainId" => json!(format!("{:#x}", self.chain_id)),
            "eth_getBalance" => json!(format!("{:#x}", self.balance)),
            "eth_getTransactionCount" => json!("0x0"),
            "eth_estimateGas" => json!("0x100000"),
            "eth_gasPrice" => json!("0x3b9aca00"),
            "eth_maxPriorityFeePerGas" => json!("0x3b9aca00"),
            "eth_feeHistory" => json!({
                "oldestBlock": "0xf",
                "baseFeePerGas": ["0x3b9aca00", "0x3b9aca00"],
                "gasUsedRatio": [0.5],
                "reward": [["0x3b9aca00"]]
            }),
            "eth_blockNumber" => json!("0x10"),
            "eth_getBlockByNumber" => Value::Null,
            "eth_sendRawTransaction" => json!(MOCK_TX_HASH),
            "eth_getTransactionReceipt" => self.receipt(),
            "eth_getCode" => json!(self.code.to_string()),
            "eth_call" => json!(self.call_result.to_string()),
            other => return Err(format!("method {} not supported", other)),
        };
        Ok(result)
    }
}

/// Running mock JSON-RPC node.
#[allow(dead_code)]
pub struct RpcBackend {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl RpcBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Methods received so far, in arrival order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, method: &str) -> bool {
        self.calls().iter().any(|m| m == method)
    }
}

/// Start a JSON-RPC backend on an ephemeral port that answers from `chain`.
#[allow(dead_code)]
pub async fn start_rpc_backend(chain: MockChain) -> RpcBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let chain = Arc::new(chain);

    let log = calls.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let chain = chain.clone();
                    let log = log.clone();
                    tokio::spawn(async move {
                        let _ = serve_rpc(socket, &chain, &log).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    RpcBackend { addr, calls }
}

#[allow(dead_code)]
async fn serve_rpc(
    mut socket: TcpStream,
    chain: &MockChain,
    log: &Mutex<Vec<String>>,
) -> std::io::Result<()> {
    let body = read_http_body(&mut socket).await?;
    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let reply = match request {
        Value::Array(batch) => Value::Array(
            batch
                .iter()
                .map(|item| rpc_reply(item, chain, log))
                .collect(),
        ),
        single => rpc_reply(&single, chain, log),
    };
    let payload = reply.to_string();

    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        payload.len(),
        payload
    );
    socket.write_all(response.as_bytes()).await?;
    socket.shutdown().await
}

#[allow(dead_code)]
fn rpc_reply(request: &Value, chain: &MockChain, log: &Mutex<Vec<String>>) -> Value {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    log.lock().unwrap().push(method.clone());

    match chain.answer(&method) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err(message) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32601, "message": message }
        }),
    }
}

#[allow(dead_code)]
async fn read_http_body(socket: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            return Ok(Vec::new());
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let content_length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(buf[header_end..].to_vec())
}
