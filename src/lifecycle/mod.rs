//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - One broadcast channel per process; every accept loop subscribes
//! - Shutdown has timeout: connections still open after the drain are dropped

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
