//! Requests and replies exchanged on a single connection.

use std::fmt;
use std::str::FromStr;

use crate::protocol::{
    BackendAddress, Message, ProtocolError, BUSY, CONFIG_PREFIX, ERROR_PREFIX, FREE, OK, PROBE,
};

/// What a peer asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `ping`: would you admit work right now?
    Probe,
    /// `config;h:p,h:p`: replace the backend set.
    Reconfigure(Vec<BackendAddress>),
    /// A timestamped data message.
    Data(Message),
}

impl FromStr for Request {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if s == PROBE {
            return Ok(Request::Probe);
        }
        if let Some(rest) = s.strip_prefix(CONFIG_PREFIX) {
            if rest.is_empty() || rest.starts_with(';') {
                let list = rest.trim_start_matches(';');
                let list = list.strip_suffix(';').unwrap_or(list);
                return BackendAddress::parse_list(list).map(Request::Reconfigure);
            }
        }
        s.parse().map(Request::Data)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Probe => f.write_str(PROBE),
            Request::Reconfigure(addrs) => {
                write!(f, "{};{}", CONFIG_PREFIX, BackendAddress::join_list(addrs))
            }
            Request::Data(msg) => write!(f, "{}", msg),
        }
    }
}

/// What a peer answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Free,
    Busy,
    Ok,
    /// The request could not be decoded or applied.
    Error(String),
    /// A data message carrying the stamps appended so far.
    Data(Message),
}

impl Reply {
    pub fn error(reason: impl fmt::Display) -> Self {
        Reply::Error(reason.to_string())
    }
}

impl FromStr for Reply {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            FREE => Ok(Reply::Free),
            BUSY => Ok(Reply::Busy),
            OK => Ok(Reply::Ok),
            _ => match s.strip_prefix(ERROR_PREFIX) {
                Some(reason) => Ok(Reply::Error(reason.trim_start_matches(';').to_string())),
                None => s.parse().map(Reply::Data),
            },
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Free => f.write_str(FREE),
            Reply::Busy => f.write_str(BUSY),
            Reply::Ok => f.write_str(OK),
            Reply::Error(reason) => write!(f, "{};{}", ERROR_PREFIX, reason),
            Reply::Data(msg) => write!(f, "{}", msg),
        }
    }
}
