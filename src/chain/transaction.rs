//! Transaction inclusion monitoring.
//!
//! # Responsibilities
//! - Poll for the receipt of a submitted transaction
//! - Turn a failed receipt into a revert
//! - Bound the wait so a stalled node surfaces as an error

use std::time::Duration;

use alloy::primitives::TxHash;
use tokio::time::{interval, timeout};

use crate::chain::client::ChainClient;
use crate::chain::types::{ChainError, ChainResult, ReceiptSummary};

/// Floor for the receipt polling period; `interval` rejects a zero period.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Wait for a transaction to be mined.
///
/// # Arguments
/// * `client` - Chain client to poll
/// * `tx_hash` - Transaction hash to monitor
/// * `max_wait` - Maximum time to wait for inclusion
/// * `poll_interval` - Delay between receipt queries, at least 1ms
pub async fn await_inclusion(
    client: &dyn ChainClient,
    tx_hash: TxHash,
    max_wait: Duration,
    poll_interval: Duration,
) -> ChainResult<ReceiptSummary> {
    let result = timeout(max_wait, async {
        let mut ticker = interval(poll_interval.max(MIN_POLL_INTERVAL));

        loop {
            ticker.tick().await;

            let receipt = match client.transaction_receipt(tx_hash).await? {
                Some(r) => r,
                None => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    continue;
                }
            };

            if !receipt.status {
                return Err(ChainError::Reverted {
                    reason: format!("transaction {} reverted on inclusion", tx_hash),
                    data: None,
                });
            }

            tracing::debug!(
                tx_hash = %tx_hash,
                block_number = ?receipt.block_number,
                gas_used = receipt.gas_used,
                "Transaction mined"
            );
            return Ok(receipt);
        }
    })
    .await;

    match result {
        Ok(receipt) => receipt,
        Err(_) => Err(ChainError::ConfirmationTimeout {
            tx_hash,
            secs: max_wait.as_secs(),
        }),
    }
}
