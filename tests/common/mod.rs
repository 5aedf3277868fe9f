//! Shared utilities for integration testing.
//!
//! `MockNode` is an in-memory development node: it tracks impersonation
//! flags, native balances, ERC-20 balances and receipts, mines every
//! transaction immediately, and can be told to fail in specific ways.
//!
//! `start_json_rpc_node` is a programmable HTTP JSON-RPC backend for
//! exercising `NodeClient` on the wire.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, TxHash, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use fork_faucet::chain::{ChainClient, ChainError, ChainResult, ReceiptSummary};
use fork_faucet::config::FaucetConfig;

pub const TOKEN: Address = address!("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const WHALE: Address = address!("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
pub const ACCOUNT_0: Address = address!("0x0101010101010101010101010101010101010101");
pub const ACCOUNT_1: Address = address!("0x0202020202020202020202020202020202020202");
pub const RECIPIENT: Address = address!("0xcccccccccccccccccccccccccccccccccccccccc");

#[derive(Default)]
struct NodeState {
    accounts: Vec<Address>,
    impersonated: HashSet<Address>,
    native: HashMap<Address, U256>,
    tokens: HashMap<(Address, Address), U256>,
    decimals: HashMap<Address, u8>,
    symbols: HashMap<Address, String>,
    receipts: HashMap<TxHash, ReceiptSummary>,
    block: u64,
    tx_count: u8,
    calls: Vec<String>,

    unsupported: bool,
    paused: HashSet<Address>,
    revert_on_inclusion: bool,
    fail_set_balance: bool,
    fail_stop_impersonating: bool,
    fail_send: bool,
    withhold_receipts: bool,
    time_out_receipts: bool,
    fail_reads_after_transfer: bool,
}

/// In-memory stand-in for a Hardhat/Anvil node.
#[derive(Default)]
pub struct MockNode {
    state: Mutex<NodeState>,
}

impl MockNode {
    /// Node with two default accounts and a 6-decimal token named USDC.
    pub fn new() -> Arc<Self> {
        let node = Self::default();
        {
            let mut state = node.state.lock().unwrap();
            state.accounts = vec![ACCOUNT_0, ACCOUNT_1];
            state.decimals.insert(TOKEN, 6);
            state.symbols.insert(TOKEN, "USDC".to_string());
            state.block = 100;
        }
        Arc::new(node)
    }

    pub fn with_token_balance(self: Arc<Self>, owner: Address, raw: u64) -> Arc<Self> {
        self.set_token_balance(owner, U256::from(raw));
        self
    }

    pub fn set_token_balance(&self, owner: Address, raw: U256) {
        self.state.lock().unwrap().tokens.insert((TOKEN, owner), raw);
    }

    pub fn set_native_balance(&self, owner: Address, wei: U256) {
        self.state.lock().unwrap().native.insert(owner, wei);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        self.state.lock().unwrap().accounts = accounts;
    }

    pub fn set_unsupported(&self) {
        self.state.lock().unwrap().unsupported = true;
    }

    pub fn pause_token(&self) {
        self.state.lock().unwrap().paused.insert(TOKEN);
    }

    pub fn revert_on_inclusion(&self) {
        self.state.lock().unwrap().revert_on_inclusion = true;
    }

    pub fn fail_set_balance(&self) {
        self.state.lock().unwrap().fail_set_balance = true;
    }

    pub fn fail_stop_impersonating(&self) {
        self.state.lock().unwrap().fail_stop_impersonating = true;
    }

    /// Drop the connection on transfer submission.
    pub fn fail_send_transfer(&self) {
        self.state.lock().unwrap().fail_send = true;
    }

    /// Accept transfers but never mine them.
    pub fn withhold_receipts(&self) {
        self.state.lock().unwrap().withhold_receipts = true;
    }

    pub fn time_out_receipts(&self) {
        self.state.lock().unwrap().time_out_receipts = true;
    }

    /// Fail `balanceOf` once any transfer has been mined.
    pub fn fail_reads_after_transfer(&self) {
        self.state.lock().unwrap().fail_reads_after_transfer = true;
    }

    pub fn token_balance(&self, owner: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .tokens
            .get(&(TOKEN, owner))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_impersonating(&self, address: Address) -> bool {
        self.state.lock().unwrap().impersonated.contains(&address)
    }

    /// Dev-extension and transaction calls seen so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn dev_call(&self, method: &str) -> ChainResult<std::sync::MutexGuard<'_, NodeState>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());
        if state.unsupported {
            return Err(ChainError::UnsupportedNode {
                method: method.to_string(),
                message: format!("Method {} not found", method),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl ChainClient for MockNode {
    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        Ok(self.state.lock().unwrap().accounts.clone())
    }

    async fn impersonate_account(&self, address: Address) -> ChainResult<()> {
        let mut state = self.dev_call("hardhat_impersonateAccount")?;
        state.impersonated.insert(address);
        Ok(())
    }

    async fn stop_impersonating_account(&self, address: Address) -> ChainResult<()> {
        let mut state = self.dev_call("hardhat_stopImpersonatingAccount")?;
        if state.fail_stop_impersonating {
            return Err(ChainError::rpc("hardhat_stopImpersonatingAccount", "connection reset"));
        }
        state.impersonated.remove(&address);
        Ok(())
    }

    async fn set_balance(&self, address: Address, wei: U256) -> ChainResult<()> {
        let mut state = self.dev_call("hardhat_setBalance")?;
        if state.fail_set_balance {
            return Err(ChainError::Timeout {
                method: "hardhat_setBalance".to_string(),
                secs: 10,
            });
        }
        state.native.insert(address, wei);
        Ok(())
    }

    async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .native
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn token_balance_of(&self, token: Address, owner: Address) -> ChainResult<U256> {
        let state = self.state.lock().unwrap();
        if state.fail_reads_after_transfer && state.tx_count > 0 {
            return Err(ChainError::rpc("balanceOf", "connection reset"));
        }
        Ok(state.tokens.get(&(token, owner)).copied().unwrap_or_default())
    }

    async fn token_decimals(&self, token: Address) -> ChainResult<u8> {
        self.state
            .lock()
            .unwrap()
            .decimals
            .get(&token)
            .copied()
            .ok_or_else(|| ChainError::rpc("decimals", "contract not deployed"))
    }

    async fn token_symbol(&self, token: Address) -> ChainResult<String> {
        self.state
            .lock()
            .unwrap()
            .symbols
            .get(&token)
            .cloned()
            .ok_or_else(|| ChainError::rpc("symbol", "contract not deployed"))
    }

    async fn send_token_transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> ChainResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("eth_sendTransaction".to_string());

        if state.fail_send {
            return Err(ChainError::rpc("eth_sendTransaction", "connection reset by peer"));
        }
        if !state.impersonated.contains(&from) {
            return Err(ChainError::rpc("eth_sendTransaction", "unknown account"));
        }
        if state.native.get(&from).copied().unwrap_or_default().is_zero() {
            return Err(ChainError::rpc(
                "eth_sendTransaction",
                "insufficient funds for gas * price + value",
            ));
        }
        if state.paused.contains(&token) {
            return Err(ChainError::Reverted {
                reason: "execution reverted: Pausable: paused".to_string(),
                data: None,
            });
        }
        let from_balance = state.tokens.get(&(token, from)).copied().unwrap_or_default();
        if from_balance < amount {
            return Err(ChainError::Reverted {
                reason: "execution reverted: ERC20: transfer amount exceeds balance".to_string(),
                data: None,
            });
        }

        state.tx_count += 1;
        let tx_hash = TxHash::with_last_byte(state.tx_count);
        if state.withhold_receipts {
            return Ok(tx_hash);
        }
        state.block += 1;
        let status = !state.revert_on_inclusion;

        if status {
            state.tokens.insert((token, from), from_balance - amount);
            let to_balance = state.tokens.get(&(token, to)).copied().unwrap_or_default();
            state.tokens.insert((token, to), to_balance + amount);
        }

        let block_number = Some(state.block);
        state.receipts.insert(
            tx_hash,
            ReceiptSummary {
                tx_hash,
                block_number,
                status,
                gas_used: 51_000,
            },
        );
        Ok(tx_hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<ReceiptSummary>> {
        let state = self.state.lock().unwrap();
        if state.time_out_receipts {
            return Err(ChainError::Timeout {
                method: "eth_getTransactionReceipt".to_string(),
                secs: 10,
            });
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }
}

/// Faucet configuration pointing at the mock token and whale.
pub fn test_config() -> FaucetConfig {
    let mut config = FaucetConfig::default();
    config.token.address = TOKEN.to_string();
    config.token.holder = WHALE.to_string();
    config.token.symbol = Some("USDC".to_string());
    config.node.confirmation_timeout_secs = 5;
    config.node.poll_interval_ms = 10;
    config
}

/// How the JSON-RPC backend answers one request.
pub enum RpcReply {
    Result(Value),
    Error {
        code: i64,
        message: String,
        data: Option<Value>,
    },
    /// Close the connection without answering.
    Hangup,
}

/// Running JSON-RPC backend and the requests it has received.
pub struct JsonRpcNode {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

impl JsonRpcNode {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// `(method, params)` of every request received, in order.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }
}

/// Start a JSON-RPC backend on an ephemeral port. `handler` decides the
/// reply for each `(method, params)`.
pub async fn start_json_rpc_node<F>(handler: F) -> JsonRpcNode
where
    F: Fn(&str, &Value) -> RpcReply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let log = requests.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let log = log.clone();
            tokio::spawn(async move {
                let Some(body) = read_http_body(&mut socket).await else {
                    return;
                };
                let Ok(request) = serde_json::from_slice::<Value>(&body) else {
                    return;
                };
                let method = request["method"].as_str().unwrap_or_default().to_string();
                let params = request["params"].clone();
                log.lock().unwrap().push((method.clone(), params.clone()));

                let payload = match handler(&method, &params) {
                    RpcReply::Result(result) => {
                        json!({"jsonrpc": "2.0", "id": request["id"], "result": result})
                    }
                    RpcReply::Error {
                        code,
                        message,
                        data,
                    } => {
                        let mut error = json!({"code": code, "message": message});
                        if let Some(data) = data {
                            error["data"] = data;
                        }
                        json!({"jsonrpc": "2.0", "id": request["id"], "error": error})
                    }
                    RpcReply::Hangup => return,
                };

                let body = payload.to_string();
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    JsonRpcNode { addr, requests }
}

async fn read_http_body(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let length = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let body_start = header_end + 4;
    while buf.len() < body_start + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Some(buf[body_start..body_start + length].to_vec())
}

/// Answers the calls a transaction submission makes before
/// `eth_sendTransaction` (chain id, nonce, gas and fee estimation).
pub fn preparation_reply(method: &str) -> Option<RpcReply> {
    let result = match method {
        "eth_chainId" => json!("0x7a69"),
        "eth_blockNumber" => json!("0x10"),
        "eth_getTransactionCount" => json!("0x0"),
        "eth_estimateGas" => json!("0xc350"),
        "eth_gasPrice" | "eth_maxPriorityFeePerGas" => json!("0x3b9aca00"),
        "eth_feeHistory" => json!({
            "oldestBlock": "0x10",
            "baseFeePerGas": ["0x3b9aca00", "0x3b9aca00"],
            "gasUsedRatio": [0.5],
            "reward": [["0x3b9aca00"]]
        }),
        _ => return None,
    };
    Some(RpcReply::Result(result))
}
