//! The Service: a worker with bounded admission and simulated processing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::net::TcpStream;
use tokio::sync::broadcast;

use crate::config::ServiceConfig;
use crate::net::connection::ConnectionId;
use crate::net::{server, Listener};
use crate::protocol::framing::{self, FrameError};
use crate::protocol::{Message, Reply, Request};
use crate::service::admission::AdmissionQueue;
use crate::service::advisor::Advisor;

/// A worker that admits at most `queue_max_size` data requests at once.
pub struct Service {
    admission: Arc<AdmissionQueue>,
    advisor: Advisor,
    service_time_ms: f64,
    service_time_std_ms: f64,
}

impl Service {
    pub fn new(config: &ServiceConfig) -> Self {
        Self::with_advisor(config, Advisor::from_config(&config.advisor))
    }

    pub fn with_advisor(config: &ServiceConfig, advisor: Advisor) -> Self {
        Self {
            admission: AdmissionQueue::new(config.queue_max_size),
            advisor,
            service_time_ms: config.service_time_ms,
            service_time_std_ms: config.service_time_std_ms,
        }
    }

    /// Shared view of the admission state.
    pub fn admission(&self) -> Arc<AdmissionQueue> {
        Arc::clone(&self.admission)
    }

    /// Accept connections until `shutdown` fires.
    pub async fn run(self, listener: Listener, shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            capacity = self.admission.capacity(),
            service_time_ms = self.service_time_ms,
            service_time_std_ms = self.service_time_std_ms,
            advisor = self.advisor.is_enabled(),
            "Service starting"
        );

        let service = Arc::new(self);
        server::serve("service", listener, shutdown, move |stream, peer, id| {
            let service = Arc::clone(&service);
            async move { service.handle_connection(stream, peer, id).await }
        })
        .await;
    }

    async fn handle_connection(&self, mut stream: TcpStream, peer: SocketAddr, id: ConnectionId) {
        let frame = match framing::read_frame(&mut stream).await {
            Ok(frame) => frame,
            Err(FrameError::Closed) => return,
            Err(e) => {
                tracing::warn!(connection_id = %id, peer = %peer, error = %e, "Failed to read request");
                self.reply(&mut stream, id, Reply::error(&e)).await;
                return;
            }
        };

        let request = match frame.parse::<Request>() {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(connection_id = %id, frame = %frame, error = %e, "Malformed request");
                self.reply(&mut stream, id, Reply::error(e)).await;
                return;
            }
        };

        match request {
            Request::Probe => {
                let reply = if self.admission.has_capacity() {
                    Reply::Free
                } else {
                    Reply::Busy
                };
                tracing::trace!(connection_id = %id, occupancy = self.admission.occupancy(), reply = %reply, "Probe answered");
                self.reply(&mut stream, id, reply).await;
            }
            Request::Reconfigure(_) => {
                self.reply(
                    &mut stream,
                    id,
                    Reply::error("services do not accept reconfiguration"),
                )
                .await;
            }
            Request::Data(message) => self.process(stream, id, message).await,
        }
    }

    async fn process(&self, mut stream: TcpStream, id: ConnectionId, mut message: Message) {
        let Some(permit) = self.admission.try_admit() else {
            tracing::debug!(
                connection_id = %id,
                cycle = %message.cycle(),
                sequence = message.sequence(),
                "Queue full, rejecting"
            );
            self.reply(&mut stream, id, Reply::Busy).await;
            return;
        };

        if let Err(e) = message.stamp_now() {
            self.reply(&mut stream, id, Reply::error(e)).await;
            return;
        }
        tracing::debug!(
            connection_id = %id,
            message = %message,
            occupancy = self.admission.occupancy(),
            "Processing"
        );

        self.advisor.consult();
        tokio::time::sleep(self.service_duration()).await;

        if let Err(e) = message.stamp_now() {
            self.reply(&mut stream, id, Reply::error(e)).await;
            return;
        }
        self.reply(&mut stream, id, Reply::Data(message)).await;

        drop(stream);
        drop(permit);
    }

    async fn reply(&self, stream: &mut TcpStream, id: ConnectionId, reply: Reply) {
        if let Err(e) = framing::write_frame(stream, &reply.to_string()).await {
            tracing::warn!(connection_id = %id, error = %e, "Failed to send reply");
        }
    }

    /// Simulated processing time: the configured mean plus Gaussian jitter.
    fn service_duration(&self) -> Duration {
        let mut millis = self.service_time_ms;
        if self.service_time_std_ms > 0.0 {
            millis += standard_normal(&mut rand::thread_rng()) * self.service_time_std_ms;
        }
        Duration::from_secs_f64(millis.max(0.0) / 1000.0)
    }
}

/// One draw from N(0, 1) (Box–Muller).
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}
