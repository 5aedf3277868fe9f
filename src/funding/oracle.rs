//! Read-only token balance queries.

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use crate::chain::{ChainClient, ChainError, ChainResult};
use crate::config::MAX_DECIMALS;
use crate::funding::amount::TokenAmount;

/// A fresh balance observation; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReading {
    pub address: Address,
    pub token: Address,
    pub balance: TokenAmount,
}

impl BalanceReading {
    pub fn raw_balance(&self) -> U256 {
        self.balance.raw()
    }

    pub fn decimals(&self) -> u8 {
        self.balance.decimals()
    }

    /// Human-readable balance, for display only.
    pub fn human(&self) -> String {
        self.balance.to_human()
    }
}

/// Reads ERC-20 balances.
#[derive(Clone)]
pub struct BalanceOracle {
    client: Arc<dyn ChainClient>,
    decimals: Option<u8>,
}

impl BalanceOracle {
    /// `decimals` overrides the on-chain `decimals()` when set.
    pub fn new(client: Arc<dyn ChainClient>, decimals: Option<u8>) -> Self {
        Self { client, decimals }
    }

    /// Decimal exponent of `token`, from configuration or the contract.
    pub async fn decimals(&self, token: Address) -> ChainResult<u8> {
        let decimals = match self.decimals {
            Some(d) => d,
            None => self.client.token_decimals(token).await?,
        };
        if decimals > MAX_DECIMALS {
            return Err(ChainError::rpc(
                "decimals",
                format!("token {} reports unsupported decimals {}", token, decimals),
            ));
        }
        Ok(decimals)
    }

    /// Current balance of `address` in `token`. A zero balance is a valid reading.
    pub async fn query(&self, token: Address, address: Address) -> ChainResult<BalanceReading> {
        let decimals = self.decimals(token).await?;
        let raw = self.client.token_balance_of(token, address).await?;

        tracing::debug!(token = %token, address = %address, raw = %raw, "Balance read");

        let balance = TokenAmount::from_raw(raw, decimals)
            .map_err(|e| ChainError::rpc("balanceOf", e.to_string()))?;
        Ok(BalanceReading {
            address,
            token,
            balance,
        })
    }
}
