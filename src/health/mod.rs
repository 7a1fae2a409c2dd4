//! Backend health checking.
//!
//! # Data Flow
//! ```text
//! Dispatch scan (load_balancer)
//!     → probe.rs: ping one backend
//!     → free | busy | unreachable
//!     → scan forwards on free, moves on otherwise
//! ```
//!
//! # Design Decisions
//! - Health is checked synchronously, per request, right before forwarding
//! - No state is kept between probes; a backend is only as healthy as its
//!   last answer
//! - Errors and timeouts are a kind of "not available", never fatal

pub mod probe;

pub use probe::{probe, Availability};
