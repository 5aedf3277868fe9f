//! ERC-20 transfers signed as an impersonated holder.
//!
//! # Responsibilities
//! - Check the impersonation handle covers the transfer's source
//! - Submit `transfer(recipient, amount)` and wait for inclusion
//! - Attribute reverts: insufficient balance vs. any other contract rejection

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};

use crate::chain::erc20::is_insufficient_balance_revert;
use crate::chain::{await_inclusion, ChainClient, ChainError, ChainResult};
use crate::funding::amount::TokenAmount;
use crate::funding::impersonation::ImpersonationHandle;

/// Confirmed token transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: TokenAmount,
}

/// Executes token transfers from impersonated accounts.
#[derive(Clone)]
pub struct TokenTransferExecutor {
    client: Arc<dyn ChainClient>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl TokenTransferExecutor {
    pub fn new(
        client: Arc<dyn ChainClient>,
        confirmation_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            confirmation_timeout,
            poll_interval,
        }
    }

    /// Transfer `amount` of `token` from the handle's address to `recipient`.
    ///
    /// Either the whole transfer is mined in one successful transaction or an
    /// error is returned and balances are untouched.
    pub async fn transfer(
        &self,
        handle: &ImpersonationHandle,
        token: Address,
        recipient: Address,
        amount: &TokenAmount,
    ) -> ChainResult<TransferReceipt> {
        let from = handle.address();
        handle.ensure_active_for(from)?;

        tracing::info!(
            token = %token,
            from = %from,
            to = %recipient,
            amount = %amount.raw(),
            "Submitting token transfer"
        );

        let submitted = async {
            let tx_hash = self
                .client
                .send_token_transfer(token, from, recipient, amount.raw())
                .await?;
            tracing::debug!(tx_hash = %tx_hash, "Transfer submitted");
            await_inclusion(
                self.client.as_ref(),
                tx_hash,
                self.confirmation_timeout,
                self.poll_interval,
            )
            .await
        }
        .await;

        match submitted {
            Ok(receipt) => Ok(TransferReceipt {
                tx_hash: receipt.tx_hash,
                block_number: receipt.block_number,
                gas_used: receipt.gas_used,
                token,
                from,
                to: recipient,
                amount: *amount,
            }),
            Err(ChainError::Reverted { reason, data }) => Err(self
                .attribute_revert(token, from, recipient, amount.raw(), reason, data)
                .await),
            Err(e) => Err(e),
        }
    }

    async fn attribute_revert(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
        reason: String,
        data: Option<String>,
    ) -> ChainError {
        let available = match self.client.token_balance_of(token, from).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                tracing::debug!(error = %e, "Could not read holder balance after revert");
                None
            }
        };

        let short = available.map(|b| b < amount).unwrap_or(false);
        if short || is_insufficient_balance_revert(&reason, data.as_deref()) {
            tracing::warn!(holder = %from, token = %token, required = %amount, "Holder balance too low");
            return ChainError::InsufficientBalance {
                holder: from,
                token,
                required: amount,
                available,
            };
        }

        tracing::warn!(token = %token, reason = %reason, "Token transfer reverted");
        ChainError::TransferReverted {
            token,
            from,
            to,
            amount,
            reason,
        }
    }
}
