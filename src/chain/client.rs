//! Chain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Define the `ChainClient` surface the funding core consumes
//! - Talk to a development node over JSON-RPC (standard + dev extensions)
//! - Bound every call with a timeout and retry idempotent ones
//! - Classify node errors into the faucet's error taxonomy

use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::TransportError;
use async_trait::async_trait;
use serde_json::json;
use tokio::time::timeout;

use crate::chain::erc20::IERC20;
use crate::chain::types::{classify_error_payload, ChainError, ChainResult, ReceiptSummary};
use crate::config::{NodeConfig, RetryConfig};
use crate::resilience::retry_with_backoff;

/// RPC surface of a development node, as consumed by the funding core.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Unlocked accounts the node exposes, in node order.
    async fn accounts(&self) -> ChainResult<Vec<Address>>;

    /// Allow transactions to be sent as `address` without its key.
    async fn impersonate_account(&self, address: Address) -> ChainResult<()>;

    /// Revoke impersonation of `address`.
    async fn stop_impersonating_account(&self, address: Address) -> ChainResult<()>;

    /// Overwrite the native balance of `address` with `wei`.
    async fn set_balance(&self, address: Address, wei: U256) -> ChainResult<()>;

    /// Native balance of `address`.
    async fn get_balance(&self, address: Address) -> ChainResult<U256>;

    /// `balanceOf(owner)` on an ERC-20 contract.
    async fn token_balance_of(&self, token: Address, owner: Address) -> ChainResult<U256>;

    /// `decimals()` on an ERC-20 contract.
    async fn token_decimals(&self, token: Address) -> ChainResult<u8>;

    /// `symbol()` on an ERC-20 contract.
    async fn token_symbol(&self, token: Address) -> ChainResult<String>;

    /// Submit `transfer(to, amount)` on `token` as `from`, unsigned.
    ///
    /// The node signs on behalf of `from`, which must be impersonated.
    async fn send_token_transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> ChainResult<TxHash>;

    /// Receipt of a transaction, `None` while pending.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<ReceiptSummary>>;
}

/// Map an alloy transport error onto the faucet's error taxonomy.
pub fn classify_transport_error(method: &str, err: &TransportError) -> ChainError {
    match err.as_error_resp() {
        Some(payload) => classify_error_payload(
            method,
            payload.code,
            &payload.message,
            payload.data.as_ref().map(|d| d.get()),
        ),
        None => ChainError::rpc(method, err.to_string()),
    }
}

fn classify_contract_error(method: &str, err: alloy::contract::Error) -> ChainError {
    match err {
        alloy::contract::Error::TransportError(e) => classify_transport_error(method, &e),
        other => ChainError::rpc(method, other.to_string()),
    }
}

/// JSON-RPC client for a Hardhat or Anvil development node.
#[derive(Clone)]
pub struct NodeClient {
    provider: DynProvider,
    config: NodeConfig,
    retries: RetryConfig,
    timeout_duration: Duration,
}

impl NodeClient {
    /// Create a new node client.
    ///
    /// Connecting is lazy; only a configured chain ID triggers a round trip,
    /// and a mismatch or unreachable node is logged rather than fatal.
    pub async fn new(config: NodeConfig, retries: RetryConfig) -> ChainResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            ChainError::rpc("connect", format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        let client = Self {
            provider,
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            config,
            retries,
        };

        if let Some(expected) = client.config.chain_id {
            match client.verify_chain_id(expected).await {
                Ok(()) => tracing::info!(
                    rpc_url = %client.config.rpc_url,
                    chain_id = expected,
                    "Node client initialized"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    "Node client initialized but chain verification failed"
                ),
            }
        }

        Ok(client)
    }

    /// Verify the connected chain ID matches `expected`.
    pub async fn verify_chain_id(&self, expected: u64) -> ChainResult<()> {
        let actual = self.get_chain_id().await?;
        if actual != expected {
            return Err(ChainError::ChainMismatch { expected, actual });
        }
        Ok(())
    }

    /// Get the chain ID from the node.
    pub async fn get_chain_id(&self) -> ChainResult<u64> {
        let method = "eth_chainId";
        retry_with_backoff(&self.retries, method, move || async move {
            self.bounded(method, async move {
                self.provider
                    .get_chain_id()
                    .await
                    .map_err(|e| classify_transport_error(method, &e))
            })
            .await
        })
        .await
    }

    async fn bounded<T, F>(&self, method: &str, fut: F) -> ChainResult<T>
    where
        F: Future<Output = ChainResult<T>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(method = method, "RPC timeout");
                Err(ChainError::Timeout {
                    method: method.to_string(),
                    secs: self.timeout_duration.as_secs(),
                })
            }
        }
    }

    /// Call a development extension such as `hardhat_setBalance`.
    async fn dev_request(&self, name: &str, params: serde_json::Value) -> ChainResult<()> {
        let method_name = self.config.rpc_namespace.method(name);
        let method = method_name.as_str();

        retry_with_backoff(&self.retries, method, move || {
            let params = params.clone();
            async move {
                self.bounded(method, async move {
                    self.provider
                        .raw_request::<_, serde_json::Value>(Cow::Owned(method.to_string()), params)
                        .await
                        .map_err(|e| classify_transport_error(method, &e))
                })
                .await
            }
        })
        .await?;

        tracing::debug!(method = method, "Dev extension call succeeded");
        Ok(())
    }
}

#[async_trait]
impl ChainClient for NodeClient {
    async fn accounts(&self) -> ChainResult<Vec<Address>> {
        let method = "eth_accounts";
        retry_with_backoff(&self.retries, method, move || async move {
            self.bounded(method, async move {
                self.provider
                    .get_accounts()
                    .await
                    .map_err(|e| classify_transport_error(method, &e))
            })
            .await
        })
        .await
    }

    async fn impersonate_account(&self, address: Address) -> ChainResult<()> {
        self.dev_request("impersonateAccount", json!([address])).await
    }

    async fn stop_impersonating_account(&self, address: Address) -> ChainResult<()> {
        self.dev_request("stopImpersonatingAccount", json!([address])).await
    }

    async fn set_balance(&self, address: Address, wei: U256) -> ChainResult<()> {
        self.dev_request("setBalance", json!([address, format!("0x{:x}", wei)]))
            .await
    }

    async fn get_balance(&self, address: Address) -> ChainResult<U256> {
        let method = "eth_getBalance";
        retry_with_backoff(&self.retries, method, move || async move {
            self.bounded(method, async move {
                self.provider
                    .get_balance(address)
                    .await
                    .map_err(|e| classify_transport_error(method, &e))
            })
            .await
        })
        .await
    }

    async fn token_balance_of(&self, token: Address, owner: Address) -> ChainResult<U256> {
        let method = "balanceOf";
        retry_with_backoff(&self.retries, method, move || async move {
            self.bounded(method, async move {
                IERC20::new(token, self.provider.clone())
                    .balanceOf(owner)
                    .call()
                    .await
                    .map_err(|e| classify_contract_error(method, e))
            })
            .await
        })
        .await
    }

    async fn token_decimals(&self, token: Address) -> ChainResult<u8> {
        let method = "decimals";
        retry_with_backoff(&self.retries, method, move || async move {
            self.bounded(method, async move {
                IERC20::new(token, self.provider.clone())
                    .decimals()
                    .call()
                    .await
                    .map_err(|e| classify_contract_error(method, e))
            })
            .await
        })
        .await
    }

    async fn token_symbol(&self, token: Address) -> ChainResult<String> {
        let method = "symbol";
        retry_with_backoff(&self.retries, method, move || async move {
            self.bounded(method, async move {
                IERC20::new(token, self.provider.clone())
                    .symbol()
                    .call()
                    .await
                    .map_err(|e| classify_contract_error(method, e))
            })
            .await
        })
        .await
    }

    async fn send_token_transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> ChainResult<TxHash> {
        // Not idempotent: a retry after a lost response could transfer twice.
        let method = "eth_sendTransaction";
        self.bounded(method, async move {
            let pending = IERC20::new(token, self.provider.clone())
                .transfer(to, amount)
                .from(from)
                .send()
                .await
                .map_err(|e| classify_contract_error(method, e))?;
            Ok(*pending.tx_hash())
        })
        .await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> ChainResult<Option<ReceiptSummary>> {
        let method = "eth_getTransactionReceipt";
        retry_with_backoff(&self.retries, method, move || async move {
            self.bounded(method, async move {
                let receipt = self
                    .provider
                    .get_transaction_receipt(tx_hash)
                    .await
                    .map_err(|e| classify_transport_error(method, &e))?;
                Ok(receipt.map(|r| ReceiptSummary {
                    tx_hash: r.transaction_hash,
                    block_number: r.block_number,
                    status: r.status(),
                    gas_used: r.gas_used,
                }))
            })
            .await
        })
        .await
    }
}

impl std::fmt::Debug for NodeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("namespace", &self.config.rpc_namespace)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}
