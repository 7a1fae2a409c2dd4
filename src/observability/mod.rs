//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All roles produce:
//!     → tracing events with key=value fields
//!     → logging.rs (EnvFilter + fmt layer on stderr)
//! ```
//!
//! Per-request latency is recorded by the Source's CSV trace, not by logs.

pub mod logging;

pub use logging::init_logging;
