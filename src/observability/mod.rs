//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (address, token, tx hash)
//!     → spans around each funding run
//!
//! Consumer:
//!     → logging.rs (fmt layer on stderr, EnvFilter)
//! ```

pub mod logging;

pub use logging::init_logging;
