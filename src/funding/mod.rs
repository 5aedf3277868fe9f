//! Funding core.
//!
//! # Data Flow
//! ```text
//! FundingRequest
//!     → orchestrator.rs
//!         → impersonation.rs (acquire holder)
//!         → gas.rs (absolute native balance override)
//!         → transfer.rs (ERC-20 transfer, await inclusion)
//!         → impersonation.rs (release, on every exit path)
//!     → FundingResult
//!
//! oracle.rs reads balances independently for verification.
//! ```

pub mod amount;
pub mod gas;
pub mod impersonation;
pub mod oracle;
pub mod orchestrator;
pub mod transfer;

pub use amount::{AmountError, TokenAmount};
pub use gas::{NativeGasFunder, ONE_ETHER_WEI};
pub use impersonation::{HandleState, ImpersonationHandle, ImpersonationManager};
pub use oracle::{BalanceOracle, BalanceReading};
pub use orchestrator::{
    FundingError, FundingOrchestrator, FundingRequest, FundingResult, FundingStage,
    OrchestratorSettings,
};
pub use transfer::{TokenTransferExecutor, TransferReceipt};
