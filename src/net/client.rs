//! Outbound side of the wire protocol.
//!
//! Every role talks to its peers through a [`WireClient`]: connect, send one
//! frame, read one frame, close. Each step runs under a deadline.

use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;

use crate::protocol::framing::{self, FrameError};
use crate::protocol::{BackendAddress, ProtocolError, Reply, Request};
use crate::resilience::timeouts::{self, Timeouts};

/// Errors from one outbound exchange.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exchange with {addr} failed: {source}")]
    Frame {
        addr: String,
        #[source]
        source: FrameError,
    },

    #[error("{addr} did not answer within {after:?}")]
    Timeout { addr: String, after: Duration },

    #[error("unreadable reply from {addr}: {source}")]
    Reply {
        addr: String,
        #[source]
        source: ProtocolError,
    },
}

/// Connects, sends one frame and reads one frame back.
#[derive(Debug, Clone, Copy, Default)]
pub struct WireClient {
    timeouts: Timeouts,
}

impl WireClient {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Send raw `text` and return the raw reply. `limit` bounds the exchange
    /// after the connection is up.
    pub async fn exchange(
        &self,
        addr: &BackendAddress,
        text: &str,
        limit: Duration,
    ) -> Result<String, NetError> {
        let mut stream = timeouts::enforce(self.timeouts.connect, addr, async {
            TcpStream::connect((addr.host.as_str(), addr.port))
                .await
                .map_err(|source| NetError::Connect {
                    addr: addr.to_string(),
                    source,
                })
        })
        .await?;
        let _ = stream.set_nodelay(true);

        timeouts::enforce(limit, addr, async {
            let frame_err = |source| NetError::Frame {
                addr: addr.to_string(),
                source,
            };
            framing::write_frame(&mut stream, text).await.map_err(frame_err)?;
            framing::read_frame(&mut stream).await.map_err(frame_err)
        })
        .await
    }

    /// Ask `addr` whether it would admit work.
    pub async fn probe(&self, addr: &BackendAddress) -> Result<Reply, NetError> {
        let raw = self
            .exchange(addr, crate::protocol::PROBE, self.timeouts.probe)
            .await?;
        parse_reply(addr, &raw)
    }

    /// Send a request and decode the reply.
    pub async fn send(&self, addr: &BackendAddress, request: &Request) -> Result<Reply, NetError> {
        let raw = self
            .exchange(addr, &request.to_string(), self.timeouts.request)
            .await?;
        parse_reply(addr, &raw)
    }

    /// Send raw text under the request deadline and return the raw reply.
    pub async fn relay(&self, addr: &BackendAddress, text: &str) -> Result<String, NetError> {
        self.exchange(addr, text, self.timeouts.request).await
    }
}

fn parse_reply(addr: &BackendAddress, raw: &str) -> Result<Reply, NetError> {
    raw.parse().map_err(|source| NetError::Reply {
        addr: addr.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn one_shot_server(reply: &'static str) -> BackendAddress {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _ = framing::read_frame(&mut socket).await;
            let _ = framing::write_frame(&mut socket, reply).await;
        });
        BackendAddress::new("127.0.0.1", port)
    }

    #[tokio::test]
    async fn probe_decodes_reply() {
        let addr = one_shot_server("free").await;
        let client = WireClient::default();
        assert_eq!(client.probe(&addr).await.unwrap(), Reply::Free);
    }

    #[tokio::test]
    async fn refused_connection_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = WireClient::default();
        let err = client
            .probe(&BackendAddress::new("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Connect { .. }));
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = WireClient::new(Timeouts {
            probe: Duration::from_millis(50),
            ..Timeouts::default()
        });
        let err = client
            .probe(&BackendAddress::new("127.0.0.1", port))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::Timeout { .. }));
    }
}
