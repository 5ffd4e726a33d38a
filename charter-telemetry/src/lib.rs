//! # Charter Telemetry
//!
//! Structured logging for the charter governance toolkit.
//!
//! ## Features
//! - Structured logging with `tracing`
//! - `EnvFilter` driven verbosity (`RUST_LOG` wins over the configured level)
//! - Span helpers for parsing, validation and git synchronisation
//!
//! ## Usage
//!
//! ```rust
//! use charter_telemetry::{init_telemetry, info};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry("charter")?;
//!     info!("ready");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Span, debug, error, info, instrument, trace, warn};

pub use spans::*;

pub use init::{init_telemetry, init_with_level};
