//! Fork faucet library.
//!
//! Funds accounts on a forked or local development node by impersonating a
//! token holder, topping up its gas, transferring tokens and releasing it.

pub mod chain;
pub mod config;
pub mod funding;
pub mod observability;
pub mod resilience;
pub mod tasks;

pub use chain::{ChainClient, ChainError, NodeClient};
pub use config::FaucetConfig;
pub use funding::{FundingError, FundingOrchestrator, FundingRequest, FundingResult, TokenAmount};
pub use tasks::Faucet;
