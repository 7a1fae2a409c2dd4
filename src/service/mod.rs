//! Service (worker) role.
//!
//! # Data Flow
//! ```text
//! Accepted connection
//!     → worker.rs (read one frame)
//!         ping → admission.rs (occupancy < K ?) → free | busy
//!         data → admission.rs (try admit) → busy
//!                                        → stamp t3 → advisor.rs (background)
//!                                        → simulated work → stamp t4 → reply
//! ```
//!
//! # Design Decisions
//! - Probes never change occupancy; they are advice, not reservations
//! - The admission slot is held until the reply is written and the
//!   connection closed

pub mod admission;
pub mod advisor;
pub mod worker;

pub use admission::{AdmissionPermit, AdmissionQueue};
pub use advisor::Advisor;
pub use worker::Service;
