//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every outbound exchange with a deadline
//! - Keep connect, probe and request deadlines separate
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from other errors
//! - A probe that times out counts as `busy` at the balancer

use std::future::Future;
use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::net::client::NetError;
use crate::protocol::BackendAddress;

/// Deadlines for the phases of an outbound exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub probe: Duration,
    pub request: Duration,
}

impl From<&TimeoutConfig> for Timeouts {
    fn from(config: &TimeoutConfig) -> Self {
        Self {
            connect: Duration::from_millis(config.connect_ms),
            probe: Duration::from_millis(config.probe_ms),
            request: Duration::from_millis(config.request_ms),
        }
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::from(&TimeoutConfig::default())
    }
}

/// Run `fut`, failing with [`NetError::Timeout`] once `limit` has passed.
pub async fn enforce<F, T>(limit: Duration, addr: &BackendAddress, fut: F) -> Result<T, NetError>
where
    F: Future<Output = Result<T, NetError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(NetError::Timeout {
            addr: addr.to_string(),
            after: limit,
        }),
    }
}
