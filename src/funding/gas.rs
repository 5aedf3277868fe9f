//! Native gas funding for impersonated accounts.

use std::sync::Arc;

use alloy::primitives::{Address, U256};

use crate::chain::{ChainClient, ChainResult};

/// One ether in wei; the default gas allowance for a funding run.
pub const ONE_ETHER_WEI: u128 = 1_000_000_000_000_000_000;

/// Makes sure an account can pay for gas by overriding its native balance.
///
/// The balance is set to an absolute value rather than topped up, so repeated
/// calls converge on the same state whatever the prior balance was.
#[derive(Clone)]
pub struct NativeGasFunder {
    client: Arc<dyn ChainClient>,
}

impl NativeGasFunder {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    /// Set `address`'s native balance to exactly `amount` wei.
    pub async fn ensure_balance(&self, address: Address, amount: U256) -> ChainResult<()> {
        self.client.set_balance(address, amount).await?;
        tracing::debug!(address = %address, wei = %amount, "Native balance set");
        Ok(())
    }
}
