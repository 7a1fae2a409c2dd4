//! Synchronous availability probe.
//!
//! # Responsibilities
//! - Send `ping` to one backend and classify the answer
//! - Fold connection errors and timeouts into "not available"

use crate::net::WireClient;
use crate::protocol::{BackendAddress, Reply};

/// Outcome of probing one backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// Answered `free`.
    Free,
    /// Answered `busy`.
    Busy,
    /// Did not answer usefully; treated like `busy` by the dispatcher.
    Unreachable(String),
}

impl Availability {
    pub fn is_free(&self) -> bool {
        matches!(self, Availability::Free)
    }
}

/// Probe `addr` once.
pub async fn probe(client: &WireClient, addr: &BackendAddress) -> Availability {
    match client.probe(addr).await {
        Ok(Reply::Free) => Availability::Free,
        Ok(Reply::Busy) => Availability::Busy,
        Ok(other) => Availability::Unreachable(format!("unexpected probe reply {:?}", other.to_string())),
        Err(e) => Availability::Unreachable(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::framing;
    use tokio::net::TcpListener;

    async fn answering(reply: &'static str) -> BackendAddress {
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
    async fn classifies_answers() {
        let client = WireClient::default();
        assert_eq!(probe(&client, &answering("free").await).await, Availability::Free);
        assert_eq!(probe(&client, &answering("busy").await).await, Availability::Busy);
        assert!(matches!(
            probe(&client, &answering("ok").await).await,
            Availability::Unreachable(_)
        ));
    }

    #[tokio::test]
    async fn dead_backend_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = WireClient::default();
        let availability = probe(&client, &BackendAddress::new("127.0.0.1", port)).await;
        assert!(!availability.is_free());
    }
}
