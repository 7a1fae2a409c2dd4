//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpListener;

use latency_harness::config::{LoadBalancerConfig, ServiceConfig};
use latency_harness::lifecycle::Shutdown;
use latency_harness::load_balancer::RoundRobin;
use latency_harness::net::{Listener, WireClient};
use latency_harness::protocol::{clock, framing, BackendAddress};
use latency_harness::{LoadBalancer, Service};

/// Backends that received a data message, in arrival order.
pub type DataLog = Arc<Mutex<Vec<BackendAddress>>>;

pub fn data_log() -> DataLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn local(listener: &TcpListener) -> BackendAddress {
    let port = listener.local_addr().unwrap().port();
    BackendAddress::new("127.0.0.1", port)
}

/// Start a mock backend that answers `ping` with `probe_answer` and any
/// other frame by appending `t3;t4`, logging itself in `log`.
pub async fn start_mock_backend(probe_answer: &'static str, log: DataLog) -> BackendAddress {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = local(&listener);
    let me = addr.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            let me = me.clone();
            tokio::spawn(async move {
                let Ok(frame) = framing::read_frame(&mut socket).await else {
                    return;
                };
                let answer = if frame == "ping" {
                    probe_answer.to_string()
                } else {
                    log.lock().unwrap().push(me);
                    let now = clock::format_secs(clock::now_secs());
                    format!("{};{};{}", frame, now, now)
                };
                let _ = framing::write_frame(&mut socket, &answer).await;
            });
        }
    });
    addr
}

/// Start a backend that answers `ping` with `free` but closes any data
/// connection without replying.
pub async fn start_vanishing_backend(log: DataLog) -> BackendAddress {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = local(&listener);
    let me = addr.clone();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let log = Arc::clone(&log);
            let me = me.clone();
            tokio::spawn(async move {
                let Ok(frame) = framing::read_frame(&mut socket).await else {
                    return;
                };
                if frame == "ping" {
                    let _ = framing::write_frame(&mut socket, "free").await;
                } else {
                    log.lock().unwrap().push(me);
                    drop(socket);
                }
            });
        }
    });
    addr
}

/// Start a Service on an ephemeral port.
pub async fn start_service(queue_max_size: usize, service_time_ms: f64, shutdown: &Shutdown) -> BackendAddress {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    start_service_on(listener, queue_max_size, service_time_ms, shutdown)
}

/// Start a Service on an already bound listener.
pub fn start_service_on(
    listener: TcpListener,
    queue_max_size: usize,
    service_time_ms: f64,
    shutdown: &Shutdown,
) -> BackendAddress {
    let addr = local(&listener);
    let config = ServiceConfig {
        queue_max_size,
        service_time_ms,
        ..ServiceConfig::default()
    };
    let service = Service::new(&config);
    let rx = shutdown.subscribe();
    tokio::spawn(service.run(Listener::from_tcp(listener, 1000), rx));
    addr
}

/// Start a LoadBalancer on an ephemeral port.
pub async fn start_load_balancer(
    backends: Vec<BackendAddress>,
    shutdown: &Shutdown,
) -> (BackendAddress, Arc<RoundRobin>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    start_load_balancer_on(listener, backends, shutdown)
}

/// Start a LoadBalancer on an already bound listener.
pub fn start_load_balancer_on(
    listener: TcpListener,
    backends: Vec<BackendAddress>,
    shutdown: &Shutdown,
) -> (BackendAddress, Arc<RoundRobin>) {
    let config = LoadBalancerConfig {
        backends,
        ..LoadBalancerConfig::default()
    };
    start_load_balancer_with(listener, config, shutdown)
}

/// Start a LoadBalancer with an explicit configuration.
pub fn start_load_balancer_with(
    listener: TcpListener,
    config: LoadBalancerConfig,
    shutdown: &Shutdown,
) -> (BackendAddress, Arc<RoundRobin>) {
    let addr = local(&listener);
    let balancer = LoadBalancer::new(&config, WireClient::default());
    let selector = balancer.selector();
    let rx = shutdown.subscribe();
    tokio::spawn(balancer.run(Listener::from_tcp(listener, 1000), rx));
    (addr, selector)
}

/// Bind `n` listeners on consecutive loopback ports.
pub async fn consecutive_listeners(n: usize) -> Vec<TcpListener> {
    'attempt: for _ in 0..100 {
        let first = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = first.local_addr().unwrap().port();
        let mut listeners = vec![first];
        for offset in 1..n {
            let Some(port) = base.checked_add(offset as u16) else {
                continue 'attempt;
            };
            match TcpListener::bind(("127.0.0.1", port)).await {
                Ok(listener) => listeners.push(listener),
                Err(_) => continue 'attempt,
            }
        }
        return listeners;
    }
    panic!("no run of {} free consecutive ports", n);
}

/// One raw exchange.
pub async fn send(addr: &BackendAddress, text: &str) -> String {
    WireClient::default().relay(addr, text).await.unwrap()
}

/// Let freshly spawned servers reach their accept loop.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
