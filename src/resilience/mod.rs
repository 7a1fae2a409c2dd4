//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound exchange:
//!     → timeouts.rs (enforce connect/probe/request deadline)
//!
//! Reconfiguration delivery (Source → LoadBalancer):
//!     → On failure: backoff.rs (exponential delay with jitter before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Data requests are never retried: a lost request is a lost sample
//! - Only idempotent control messages are retried

pub mod backoff;
pub mod timeouts;
