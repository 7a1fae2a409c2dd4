//! Wire protocol shared by every role.
//!
//! # Data Flow
//! ```text
//! bytes on a TcpStream
//!     → framing.rs (one '\n'-terminated frame per direction)
//!     → command.rs (Request: probe | reconfigure | data)
//!     → message.rs (cycle;seq;t1[;t2[;t3;t4]])
//!     → address.rs (host:port lists for reconfiguration)
//!
//! Replies travel back the same way:
//!     Reply (free | busy | ok | error | data) → framing.rs → peer
//! ```
//!
//! # Design Decisions
//! - One request and one reply per connection; the connection closes after
//! - Every frame ends with '\n' so a short read never truncates a message
//! - Timestamps are relayed as text; only the hop that appends one formats it
//! - `busy` is a reply, not an error

pub mod address;
pub mod clock;
pub mod command;
pub mod framing;
pub mod message;

pub use address::BackendAddress;
pub use command::{Reply, Request};
pub use message::Message;

use thiserror::Error;

/// Literal sent to ask a peer whether it would admit work.
pub const PROBE: &str = "ping";
/// Probe answer: the peer has spare capacity.
pub const FREE: &str = "free";
/// Probe answer, or rejection of a data message.
pub const BUSY: &str = "busy";
/// Acknowledgement of a reconfiguration.
pub const OK: &str = "ok";
/// Prefix of control messages.
pub const CONFIG_PREFIX: &str = "config";
/// Prefix of error replies.
pub const ERROR_PREFIX: &str = "error";

/// Errors produced while decoding protocol text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The frame was empty.
    #[error("empty message")]
    Empty,

    /// A data message had too few fields.
    #[error("data message needs cycle;sequence;t1, got {0:?}")]
    MissingFields(String),

    /// The sequence index was not a positive integer.
    #[error("invalid sequence index {0:?}")]
    InvalidSequence(String),

    /// A timestamp field was not a number.
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),

    /// A message already carried all four timestamps.
    #[error("message already carries {0} timestamps")]
    TooManyTimestamps(usize),

    /// A backend address was not `host:port`.
    #[error("invalid backend address {0:?}")]
    InvalidAddress(String),

    /// A frame exceeded the maximum length.
    #[error("frame exceeds {0} bytes")]
    FrameTooLong(usize),

    /// A frame was not valid UTF-8.
    #[error("frame is not valid utf-8")]
    InvalidUtf8,
}
