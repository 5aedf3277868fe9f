//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FaucetConfig (validated, immutable)
//!     → CLI flags override individual fields
//! ```
//!
//! # Design Decisions
//! - Token, holder and node are configuration, never constants in the core
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    FaucetConfig, FundingConfig, NodeConfig, ObservabilityConfig, RetryConfig, RpcNamespace,
    TokenConfig,
};
pub use validation::{validate_config, ValidationError, MAX_DECIMALS};
