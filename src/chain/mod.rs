//! Chain integration subsystem.
//!
//! # Data Flow
//! ```text
//! NodeConfig (RPC URL, namespace, timeouts)
//!     → client.rs (ChainClient trait, NodeClient over alloy)
//!     → erc20.rs (token bindings, revert attribution)
//!     → transaction.rs (await inclusion of submitted transfers)
//! ```
//!
//! # Constraints
//! - Only development nodes: impersonation and balance override are
//!   Hardhat/Anvil extensions
//! - No private keys; transfers are signed by the node for impersonated senders
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod erc20;
pub mod transaction;
pub mod types;

pub use client::{ChainClient, NodeClient};
pub use transaction::await_inclusion;
pub use types::{ChainError, ChainResult, ReceiptSummary};
