//! Operator tasks: hand out tokens from the configured holder, or check a balance.
//!
//! Both tasks default to the node's first unlocked account when no address
//! is given, matching the accounts a local test environment signs with.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use alloy::primitives::Address;
use thiserror::Error;

use crate::chain::{ChainClient, ChainError};
use crate::config::{ConfigError, FaucetConfig};
use crate::funding::{
    AmountError, BalanceReading, FundingError, FundingOrchestrator, FundingRequest,
    FundingResult, OrchestratorSettings, TokenAmount,
};

/// Errors surfaced by the operator tasks.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("invalid amount: {0}")]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Funding(#[from] FundingError),

    #[error("no address given and the node exposes no accounts")]
    NoDefaultAccount,
}

/// An address a task acts on, and whether it was defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub address: Address,
    pub is_default: bool,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        if self.is_default {
            write!(f, " (Account #0)")?;
        }
        Ok(())
    }
}

/// Result of `get-usdc`.
#[derive(Debug, Clone)]
pub struct GetTokensReport {
    pub recipient: Target,
    pub symbol: String,
    pub result: FundingResult,
}

impl fmt::Display for GetTokensReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successfully transferred {} {} to {}",
            self.result.amount, self.symbol, self.recipient
        )
    }
}

/// Result of `check-usdc`.
#[derive(Debug, Clone)]
pub struct BalanceReport {
    pub target: Target,
    pub symbol: String,
    pub reading: BalanceReading,
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Balance for {}: {} {}",
            self.symbol,
            self.target,
            self.reading.human(),
            self.symbol
        )
    }
}

/// Shared wiring for the operator tasks.
#[derive(Clone)]
pub struct Faucet {
    client: Arc<dyn ChainClient>,
    orchestrator: FundingOrchestrator,
    token: Address,
    holder: Address,
    symbol: Option<String>,
}

impl Faucet {
    /// Build the faucet from a validated configuration.
    pub fn new(client: Arc<dyn ChainClient>, config: &FaucetConfig) -> Result<Self, TaskError> {
        let token = parse_address(&config.token.address)?;
        let holder = parse_address(&config.token.holder)?;
        let settings = OrchestratorSettings::from_config(config)?;

        Ok(Self {
            orchestrator: FundingOrchestrator::new(client.clone(), settings),
            client,
            token,
            holder,
            symbol: config.token.symbol.clone(),
        })
    }

    pub fn orchestrator(&self) -> &FundingOrchestrator {
        &self.orchestrator
    }

    /// Use `address`, or the node's first account when none is given.
    pub async fn resolve_target(&self, address: Option<Address>) -> Result<Target, TaskError> {
        if let Some(address) = address {
            return Ok(Target {
                address,
                is_default: false,
            });
        }

        let accounts = self.client.accounts().await?;
        let address = accounts.first().copied().ok_or(TaskError::NoDefaultAccount)?;
        Ok(Target {
            address,
            is_default: true,
        })
    }

    async fn symbol(&self) -> Result<String, TaskError> {
        match &self.symbol {
            Some(symbol) => Ok(symbol.clone()),
            None => Ok(self.client.token_symbol(self.token).await?),
        }
    }

    /// Transfer `whole_units` human units of the token from the holder.
    pub async fn get_tokens(
        &self,
        address: Option<Address>,
        whole_units: u64,
    ) -> Result<GetTokensReport, TaskError> {
        let recipient = self.resolve_target(address).await?;
        let decimals = self.orchestrator.oracle().decimals(self.token).await?;
        let amount = TokenAmount::from_whole(whole_units, decimals)?;
        let symbol = self.symbol().await?;

        let request = FundingRequest::new(recipient.address, amount, self.holder, self.token);
        let result = self.orchestrator.fund(&request).await?;

        Ok(GetTokensReport {
            recipient,
            symbol,
            result,
        })
    }

    /// Read the token balance of `address` (or the default account).
    pub async fn check_balance(&self, address: Option<Address>) -> Result<BalanceReport, TaskError> {
        let target = self.resolve_target(address).await?;
        let reading = self.orchestrator.oracle().query(self.token, target.address).await?;
        let symbol = self.symbol().await?;

        Ok(BalanceReport {
            target,
            symbol,
            reading,
        })
    }
}

/// Parse a hex address, reporting the offending input on failure.
pub fn parse_address(value: &str) -> Result<Address, ChainError> {
    Address::from_str(value.trim()).map_err(|_| ChainError::InvalidAddress(value.to_string()))
}
