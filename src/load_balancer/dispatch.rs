//! Probe-gated round-robin forwarding of one data message.

use crate::health::{self, Availability};
use crate::load_balancer::round_robin::RoundRobin;
use crate::net::{NetError, WireClient};
use crate::protocol::{BackendAddress, Message};

/// Result of trying to place one message on a backend.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A backend probed free; this is its raw reply to the forwarded message.
    Forwarded {
        backend: BackendAddress,
        response: String,
    },
    /// No backend probed free (or the set was empty).
    Exhausted { probed: usize },
    /// A backend probed free but the forward itself failed.
    ForwardFailed {
        backend: BackendAddress,
        error: NetError,
    },
}

/// Scan from the cursor, forward to the first backend that answers `free`.
pub async fn dispatch(
    selector: &RoundRobin,
    client: &WireClient,
    message: &Message,
) -> DispatchOutcome {
    let mut scan = selector.scan();
    let mut chosen = None;

    while let Some(backend) = scan.next() {
        match health::probe(client, &backend).await {
            Availability::Free => {
                chosen = Some(backend);
                break;
            }
            Availability::Busy => {
                tracing::trace!(backend = %backend, "Backend busy");
            }
            Availability::Unreachable(reason) => {
                tracing::debug!(backend = %backend, reason = %reason, "Backend unreachable during probe");
            }
        }
    }

    let Some(backend) = chosen else {
        return DispatchOutcome::Exhausted {
            probed: scan.visited().len(),
        };
    };

    match client.relay(&backend, &message.to_string()).await {
        Ok(response) => DispatchOutcome::Forwarded { backend, response },
        Err(error) => DispatchOutcome::ForwardFailed { backend, error },
    }
}
