//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the faucet.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::funding::ONE_ETHER_WEI;

/// Root configuration for the faucet.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FaucetConfig {
    /// Development node connection settings.
    pub node: NodeConfig,

    /// Token being handed out and the account it is drawn from.
    pub token: TokenConfig,

    /// Gas funding and impersonation behaviour.
    pub funding: FundingConfig,

    /// Retry configuration for idempotent RPC calls.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC namespace used for the node's development extensions.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RpcNamespace {
    /// `hardhat_impersonateAccount`, `hardhat_setBalance`, ...
    #[default]
    Hardhat,
    /// `anvil_impersonateAccount`, `anvil_setBalance`, ...
    Anvil,
}

impl RpcNamespace {
    /// Full method name for a development extension, e.g. `hardhat_setBalance`.
    pub fn method(&self, name: &str) -> String {
        match self {
            RpcNamespace::Hardhat => format!("hardhat_{}", name),
            RpcNamespace::Anvil => format!("anvil_{}", name),
        }
    }
}

/// Development node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Expected chain ID (8453 for a Base fork, 31337 for plain Anvil).
    /// Only checked when set.
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Maximum time to wait for a transfer to be mined, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub poll_interval_ms: u64,

    /// Namespace of the impersonation and balance-override methods.
    pub rpc_namespace: RpcNamespace,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: None,
            rpc_timeout_secs: 10,
            confirmation_timeout_secs: 60,
            poll_interval_ms: 250,
            rpc_namespace: RpcNamespace::Hardhat,
        }
    }
}

/// Token configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Display symbol used in task output. Queried from the contract when unset.
    pub symbol: Option<String>,

    /// ERC-20 contract address.
    pub address: String,

    /// Whale account the tokens are drawn from.
    pub holder: String,

    /// Decimal exponent. Queried from the contract when unset.
    pub decimals: Option<u8>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        // Native USDC on Base mainnet and a large holder, for a forked node.
        Self {
            symbol: None,
            address: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
            holder: "0x0B0A5886664376F59C351ba3f598C8A8B4D0A6f3".to_string(),
            decimals: None,
        }
    }
}

/// Funding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FundingConfig {
    /// Native balance (wei, decimal or 0x-hex) written to the holder before
    /// the transfer. Absolute value, not an increment.
    pub gas_balance_wei: String,

    /// Serialize impersonation of the same holder within this process.
    pub serialize_per_holder: bool,
}

impl Default for FundingConfig {
    fn default() -> Self {
        Self {
            gas_balance_wei: ONE_ETHER_WEI.to_string(),
            serialize_per_holder: true,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}
