//! Funding orchestration: acquire, fund gas, transfer, release.
//!
//! # State Machine
//! ```text
//! Idle → Impersonating → Funded → Transferred → Released
//!            │              │          │
//!            ▼              ▼          ▼
//!   ImpersonationFailed  FundingFailed  TransferFailed
//! ```
//! Every path that got past `Impersonating` releases the holder before the
//! result is returned, including the failure paths.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, TxHash, U256};
use thiserror::Error;
use tracing::Instrument;

use crate::chain::{ChainClient, ChainError};
use crate::config::{ConfigError, FaucetConfig, ValidationError};
use crate::funding::amount::TokenAmount;
use crate::funding::gas::NativeGasFunder;
use crate::funding::impersonation::{ImpersonationHandle, ImpersonationManager};
use crate::funding::oracle::{BalanceOracle, BalanceReading};
use crate::funding::transfer::{TokenTransferExecutor, TransferReceipt};

/// Progress of a single funding run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingStage {
    Idle,
    Impersonating,
    Funded,
    Transferred,
    Released,
}

/// One "send `amount` of `token` from `holder` to `recipient`" run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingRequest {
    recipient: Address,
    amount: TokenAmount,
    holder: Address,
    token: Address,
}

impl FundingRequest {
    pub fn new(recipient: Address, amount: TokenAmount, holder: Address, token: Address) -> Self {
        Self {
            recipient,
            amount,
            holder,
            token,
        }
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn amount(&self) -> &TokenAmount {
        &self.amount
    }

    pub fn holder(&self) -> Address {
        self.holder
    }

    pub fn token(&self) -> Address {
        self.token
    }
}

/// Outcome of a successful funding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingResult {
    pub recipient: Address,
    pub amount: TokenAmount,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Recipient balance after minus before, in raw units.
    ///
    /// `None` when the balance could not be re-read after the transfer was
    /// mined; the transfer itself still happened.
    pub recipient_delta: Option<U256>,
    pub recipient_balance: Option<BalanceReading>,
}

/// Funding failures, with enough context to diagnose without re-querying.
#[derive(Debug, Error)]
pub enum FundingError {
    #[error("could not read balance of {address} in token {token}: {error}")]
    BalanceQueryFailed {
        address: Address,
        token: Address,
        #[source]
        error: ChainError,
    },

    #[error("could not impersonate holder {holder} to send {amount} of token {token}: {error}")]
    ImpersonationFailed {
        holder: Address,
        token: Address,
        amount: U256,
        #[source]
        error: ChainError,
    },

    #[error("could not fund holder {holder} with gas to send {amount} of token {token}: {error}")]
    FundingFailed {
        holder: Address,
        token: Address,
        amount: U256,
        #[source]
        error: ChainError,
    },

    #[error("transfer of {amount} of token {token} from {holder} to {recipient} failed: {error}")]
    TransferFailed {
        holder: Address,
        recipient: Address,
        token: Address,
        amount: U256,
        #[source]
        error: ChainError,
    },

    #[error("could not stop impersonating holder {holder} (transfer tx {tx_hash:?}): {error}")]
    ReleaseFailed {
        holder: Address,
        tx_hash: Option<TxHash>,
        #[source]
        error: ChainError,
    },
}

impl FundingError {
    /// Underlying chain error.
    pub fn chain_error(&self) -> &ChainError {
        match self {
            FundingError::BalanceQueryFailed { error, .. }
            | FundingError::ImpersonationFailed { error, .. }
            | FundingError::FundingFailed { error, .. }
            | FundingError::TransferFailed { error, .. }
            | FundingError::ReleaseFailed { error, .. } => error,
        }
    }
}

/// Tunables for an orchestrator, resolved from configuration.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Absolute native balance written to the holder before transferring.
    pub gas_balance: U256,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub serialize_per_holder: bool,
    /// Token decimals override; queried from the contract when `None`.
    pub decimals: Option<u8>,
}

impl OrchestratorSettings {
    pub fn from_config(config: &FaucetConfig) -> Result<Self, ConfigError> {
        let gas_balance = U256::from_str(config.funding.gas_balance_wei.trim()).map_err(|_| {
            ConfigError::Validation(vec![ValidationError {
                field: "funding.gas_balance_wei".to_string(),
                message: format!("'{}' is not a valid wei amount", config.funding.gas_balance_wei),
            }])
        })?;

        Ok(Self {
            gas_balance,
            confirmation_timeout: Duration::from_secs(config.node.confirmation_timeout_secs),
            poll_interval: Duration::from_millis(config.node.poll_interval_ms),
            serialize_per_holder: config.funding.serialize_per_holder,
            decimals: config.token.decimals,
        })
    }
}

/// Composes impersonation, gas funding and transfer into one operation.
#[derive(Clone)]
pub struct FundingOrchestrator {
    impersonation: ImpersonationManager,
    gas: NativeGasFunder,
    executor: TokenTransferExecutor,
    oracle: BalanceOracle,
    gas_balance: U256,
}

impl FundingOrchestrator {
    pub fn new(client: Arc<dyn ChainClient>, settings: OrchestratorSettings) -> Self {
        Self {
            impersonation: ImpersonationManager::new(client.clone(), settings.serialize_per_holder),
            gas: NativeGasFunder::new(client.clone()),
            executor: TokenTransferExecutor::new(
                client.clone(),
                settings.confirmation_timeout,
                settings.poll_interval,
            ),
            oracle: BalanceOracle::new(client, settings.decimals),
            gas_balance: settings.gas_balance,
        }
    }

    /// Balance oracle sharing this orchestrator's client and decimals.
    pub fn oracle(&self) -> &BalanceOracle {
        &self.oracle
    }

    /// Run one funding request to completion.
    pub async fn fund(&self, request: &FundingRequest) -> Result<FundingResult, FundingError> {
        let span = tracing::info_span!(
            "fund",
            holder = %request.holder,
            recipient = %request.recipient,
            token = %request.token,
            amount = %request.amount.raw(),
        );
        self.fund_inner(request).instrument(span).await
    }

    async fn fund_inner(&self, request: &FundingRequest) -> Result<FundingResult, FundingError> {
        let mut stage = FundingStage::Idle;
        let before = self.read_recipient(request).await?;

        advance(&mut stage, FundingStage::Impersonating);
        let mut handle = self
            .impersonation
            .acquire(request.holder)
            .await
            .map_err(|error| FundingError::ImpersonationFailed {
                holder: request.holder,
                token: request.token,
                amount: request.amount.raw(),
                error,
            })?;

        let outcome = self.fund_and_transfer(&handle, request, &mut stage).await;
        let released = self.impersonation.release(&mut handle).await;

        let receipt = match (outcome, released) {
            (Ok(receipt), Ok(())) => receipt,
            (Ok(receipt), Err(error)) => {
                return Err(FundingError::ReleaseFailed {
                    holder: request.holder,
                    tx_hash: Some(receipt.tx_hash),
                    error,
                })
            }
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(release_error)) => {
                tracing::error!(
                    holder = %request.holder,
                    error = %release_error,
                    "Release after failed funding run also failed"
                );
                return Err(e);
            }
        };
        advance(&mut stage, FundingStage::Released);

        // The tokens have moved; a failed read must not report the run as failed.
        let after = match self.read_recipient(request).await {
            Ok(reading) => Some(reading),
            Err(e) => {
                tracing::warn!(
                    tx_hash = %receipt.tx_hash,
                    error = %e,
                    "Transfer mined but recipient balance could not be re-read"
                );
                None
            }
        };
        let recipient_delta = after
            .as_ref()
            .map(|reading| reading.raw_balance().saturating_sub(before.raw_balance()));

        tracing::info!(
            tx_hash = %receipt.tx_hash,
            delta = ?recipient_delta,
            "Funding complete"
        );

        Ok(FundingResult {
            recipient: request.recipient,
            amount: request.amount,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            recipient_delta,
            recipient_balance: after,
        })
    }

    async fn fund_and_transfer(
        &self,
        handle: &ImpersonationHandle,
        request: &FundingRequest,
        stage: &mut FundingStage,
    ) -> Result<TransferReceipt, FundingError> {
        self.gas
            .ensure_balance(request.holder, self.gas_balance)
            .await
            .map_err(|error| FundingError::FundingFailed {
                holder: request.holder,
                token: request.token,
                amount: request.amount.raw(),
                error,
            })?;
        advance(stage, FundingStage::Funded);

        let receipt = self
            .executor
            .transfer(handle, request.token, request.recipient, &request.amount)
            .await
            .map_err(|error| FundingError::TransferFailed {
                holder: request.holder,
                recipient: request.recipient,
                token: request.token,
                amount: request.amount.raw(),
                error,
            })?;
        advance(stage, FundingStage::Transferred);

        Ok(receipt)
    }

    async fn read_recipient(&self, request: &FundingRequest) -> Result<BalanceReading, FundingError> {
        self.oracle
            .query(request.token, request.recipient)
            .await
            .map_err(|error| FundingError::BalanceQueryFailed {
                address: request.recipient,
                token: request.token,
                error,
            })
    }
}

fn advance(stage: &mut FundingStage, next: FundingStage) {
    tracing::debug!(from = ?*stage, to = ?next, "Funding stage");
    *stage = next;
}
