//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (id + lifetime tracking)
//!     → server.rs (task per connection, drain on shutdown)
//!     → hand off to the role's connection handler
//!
//! Outgoing exchange
//!     → client.rs (connect, one frame out, one frame back, close)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked so servers can drain on shutdown
//! - Outbound I/O always runs under a deadline

pub mod client;
pub mod connection;
pub mod listener;
pub mod server;

pub use client::{NetError, WireClient};
pub use listener::Listener;
