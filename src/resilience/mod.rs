//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Idempotent RPC call:
//!     → chain client enforces the per-call timeout
//!     → On transport failure: retries.rs (RetryConfig::delay_for, backoff.rs)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every RPC call has a deadline
//! - Retries only for idempotent calls (reads, impersonation, balance override)
//! - Jittered backoff avoids hammering a restarting node

pub mod backoff;
pub mod retries;

pub use retries::retry_with_backoff;
