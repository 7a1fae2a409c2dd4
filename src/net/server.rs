//! Accept loop shared by the LoadBalancer and the Service.
//!
//! # Responsibilities
//! - Accept until the shutdown signal fires
//! - Spawn one task per connection
//! - Keep accept errors from ending the loop
//! - Drain in-flight connections before returning

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::net::connection::{ConnectionId, ConnectionTracker};
use crate::net::listener::Listener;

/// How long a stopping server waits for open connections.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Serve connections from `listener` with `handler` until `shutdown` fires.
pub async fn serve<H, Fut>(
    role: &'static str,
    listener: Listener,
    mut shutdown: broadcast::Receiver<()>,
    handler: H,
) where
    H: Fn(TcpStream, SocketAddr, ConnectionId) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let tracker = ConnectionTracker::new();
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(role, address = %addr, "Accepting connections");
    }

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer, permit)) => {
                    let guard = tracker.track();
                    let task = handler(stream, peer, guard.id());
                    tokio::spawn(async move {
                        task.await;
                        drop(guard);
                        drop(permit);
                    });
                }
                Err(e) => {
                    tracing::warn!(role, error = %e, "Accept failed");
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            },
            _ = shutdown.recv() => {
                tracing::info!(role, "Shutdown signal received, no longer accepting");
                break;
            }
        }
    }

    if !tracker.drain(DRAIN_TIMEOUT).await {
        tracing::warn!(
            role,
            open_connections = tracker.active_count(),
            "Connections still open after drain timeout"
        );
    }
    tracing::info!(role, "Server stopped");
}
