//! The LoadBalancer: control, probe and data traffic on one port.
//!
//! # Responsibilities
//! - Replace the backend set on `config;...`
//! - Answer `ping` from its own in-flight bound
//! - Stamp `t2` and hand data messages to the dispatcher
//! - Relay the backend's reply verbatim, or answer `busy`

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::config::LoadBalancerConfig;
use crate::load_balancer::backend_set::BackendSet;
use crate::load_balancer::dispatch::{dispatch, DispatchOutcome};
use crate::load_balancer::round_robin::RoundRobin;
use crate::net::connection::ConnectionId;
use crate::net::{server, Listener, WireClient};
use crate::protocol::framing::{self, FrameError};
use crate::protocol::{BackendAddress, Message, Reply, Request};
use crate::service::AdmissionQueue;

/// Balancer state shared by every connection task.
pub struct LoadBalancer {
    selector: Arc<RoundRobin>,
    inflight: Arc<AdmissionQueue>,
    client: WireClient,
}

impl LoadBalancer {
    pub fn new(config: &LoadBalancerConfig, client: WireClient) -> Self {
        Self {
            selector: Arc::new(RoundRobin::new(BackendSet::new(config.backends.clone()))),
            inflight: AdmissionQueue::new(config.queue_max_size),
            client,
        }
    }

    /// Shared view of the dispatch state.
    pub fn selector(&self) -> Arc<RoundRobin> {
        Arc::clone(&self.selector)
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, listener: Listener, shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            backends = %self.selector.backends(),
            queue_max_size = self.inflight.capacity(),
            "LoadBalancer starting"
        );

        let balancer = Arc::new(self);
        server::serve("load_balancer", listener, shutdown, move |stream, peer, id| {
            let balancer = Arc::clone(&balancer);
            async move { balancer.handle_connection(stream, peer, id).await }
        })
        .await;
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr, id: ConnectionId) {
        let frame = match framing::read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(FrameError::Closed) => return,
            Err(e) => {
                tracing::warn!(connection_id = %id, peer = %peer, error = %e, "Failed to read request");
                reply(&mut stream, id, &Reply::error(&e).to_string()).await;
                return;
            }
        };

        match frame.parse::<Request>() {
            Ok(Request::Probe) => {
                let answer = if self.inflight.has_capacity() {
                    Reply::Free
                } else {
                    Reply::Busy
                };
                reply(&mut stream, id, &answer.to_string()).await;
            }
            Ok(Request::Reconfigure(addrs)) => {
                self.reconfigure(addrs, peer);
                reply(&mut stream, id, &Reply::Ok.to_string()).await;
            }
            Ok(Request::Data(message)) => self.forward(stream, id, message).await,
            Err(e) => {
                tracing::warn!(connection_id = %id, peer = %peer, frame = %frame, error = %e, "Malformed request");
                reply(&mut stream, id, &Reply::error(e).to_string()).await;
            }
        }
    }

    fn reconfigure(&self, addrs: Vec<BackendAddress>, peer: SocketAddr) {
        let backends = BackendSet::new(addrs);
        let new_list = backends.to_string();
        let previous = self.selector.replace(backends);
        tracing::info!(
            peer = %peer,
            previous = %previous,
            backends = %new_list,
            "Backend set replaced"
        );
    }

    async fn forward(&self, mut stream: TcpStream, id: ConnectionId, mut message: Message) {
        let Some(_slot) = self.inflight.try_admit() else {
            tracing::debug!(connection_id = %id, "In-flight limit reached, rejecting");
            reply(&mut stream, id, &Reply::Busy.to_string()).await;
            return;
        };

        if let Err(e) = message.stamp_now() {
            reply(&mut stream, id, &Reply::error(e).to_string()).await;
            return;
        }

        match dispatch(&self.selector, &self.client, &message).await {
            DispatchOutcome::Forwarded { backend, response } => {
                tracing::debug!(
                    connection_id = %id,
                    backend = %backend,
                    response = %response,
                    "Forwarded"
                );
                reply(&mut stream, id, &response).await;
            }
            DispatchOutcome::Exhausted { probed } => {
                tracing::debug!(
                    connection_id = %id,
                    cycle = %message.cycle(),
                    sequence = message.sequence(),
                    probed,
                    "No free backend"
                );
                reply(&mut stream, id, &Reply::Busy.to_string()).await;
            }
            DispatchOutcome::ForwardFailed { backend, error } => {
                tracing::warn!(
                    connection_id = %id,
                    backend = %backend,
                    error = %error,
                    "Forwarding failed, closing client connection"
                );
            }
        }
    }
}

async fn reply(stream: &mut TcpStream, id: ConnectionId, text: &str) {
    if let Err(e) = framing::write_frame(stream, text).await {
        tracing::warn!(connection_id = %id, error = %e, "Failed to send reply");
    }
}
