//! Source (load generator) role.
//!
//! # Data Flow
//! ```text
//! for each cycle (index, qts):
//!     → naming.rs (qts backends per balancer)
//!     → driver.rs: config;... to every balancer (retried with backoff)
//!     → driver.rs: launch N data messages, round robin over balancers
//!     → bounded barrier: join every unit or abandon at the deadline
//!     → cycle.rs (tally) → trace.rs (CSV rows)
//! ```
//!
//! # Design Decisions
//! - Data requests are never retried
//! - Replies are collected in completion order, not sequence order

pub mod cycle;
pub mod driver;
pub mod naming;
pub mod trace;

pub use cycle::{Cycle, CycleSummary, SendOutcome};
pub use driver::{Source, SourceError};
pub use trace::{TraceRecord, TraceWriter, TRACE_HEADER};
