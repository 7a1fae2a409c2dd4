//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! config;h:p,...  → server.rs → backend_set.rs (dedupe) → round_robin.rs (replace, cursor = 0)
//!
//! data message    → server.rs (in-flight bound, stamp t2)
//!     → dispatch.rs
//!         → round_robin.rs scan (each step advances the cursor)
//!         → health::probe each candidate
//!         → first `free` gets the message; its reply is relayed verbatim
//!         → nobody free → `busy`
//! ```
//!
//! # Design Decisions
//! - Backend set and cursor share one lock; probing happens outside it
//! - Reconfiguration replaces the set wholesale, never merges
//! - A scan that began before a reconfiguration may still pick an old backend
//! - Probe failures are treated as `busy`, not as errors

pub mod backend_set;
pub mod dispatch;
pub mod round_robin;
pub mod server;

pub use backend_set::BackendSet;
pub use round_robin::RoundRobin;
pub use server::LoadBalancer;
