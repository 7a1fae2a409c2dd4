//! LoadBalancer dispatch against scripted backends.

use std::time::Duration;

use latency_harness::config::LoadBalancerConfig;
use latency_harness::lifecycle::Shutdown;
use latency_harness::net::{NetError, WireClient};
use latency_harness::protocol::{BackendAddress, Message};
use tokio::net::TcpListener;

mod common;

#[tokio::test]
async fn sequential_dispatch_rotates_over_free_backends() {
    let log = common::data_log();
    let mut backends = Vec::new();
    for _ in 0..3 {
        backends.push(common::start_mock_backend("free", log.clone()).await);
    }
    let shutdown = Shutdown::new();
    let (lb, _) = common::start_load_balancer(backends.clone(), &shutdown).await;

    for seq in 1..=6 {
        let reply = common::send(&lb, &format!("0;{};100.0", seq)).await;
        let msg: Message = reply.parse().unwrap();
        assert!(msg.is_complete(), "incomplete reply {}", reply);
        assert_eq!(msg.sequence(), seq);
    }

    let expected: Vec<BackendAddress> = backends.iter().cycle().take(6).cloned().collect();
    assert_eq!(*log.lock().unwrap(), expected);
    shutdown.trigger();
}

#[tokio::test]
async fn all_busy_backends_yield_busy_without_forwarding() {
    let log = common::data_log();
    let backends = vec![
        common::start_mock_backend("busy", log.clone()).await,
        common::start_mock_backend("busy", log.clone()).await,
    ];
    let shutdown = Shutdown::new();
    let (lb, selector) = common::start_load_balancer(backends, &shutdown).await;

    assert_eq!(common::send(&lb, "0;1;100.0").await, "busy");
    assert!(log.lock().unwrap().is_empty());
    // Two probes, one full turn.
    assert_eq!(selector.cursor(), 0);
    shutdown.trigger();
}

#[tokio::test]
async fn unreachable_backend_is_skipped() {
    let dead = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        BackendAddress::new("127.0.0.1", listener.local_addr().unwrap().port())
    };
    let log = common::data_log();
    let live = common::start_mock_backend("free", log.clone()).await;
    let shutdown = Shutdown::new();
    let (lb, _) = common::start_load_balancer(vec![dead, live.clone()], &shutdown).await;

    let reply = common::send(&lb, "0;1;100.0").await;
    assert!(reply.parse::<Message>().unwrap().is_complete());
    assert_eq!(*log.lock().unwrap(), vec![live]);
    shutdown.trigger();
}

#[tokio::test]
async fn reconfiguration_switches_targets() {
    let old_log = common::data_log();
    let new_log = common::data_log();
    let old = common::start_mock_backend("free", old_log.clone()).await;
    let fresh = vec![
        common::start_mock_backend("free", new_log.clone()).await,
        common::start_mock_backend("free", new_log.clone()).await,
    ];
    let shutdown = Shutdown::new();
    let (lb, selector) = common::start_load_balancer(vec![old], &shutdown).await;

    common::send(&lb, "0;1;100.0").await;
    assert_eq!(old_log.lock().unwrap().len(), 1);

    let command = format!("config;{}", BackendAddress::join_list(&fresh));
    assert_eq!(common::send(&lb, &command).await, "ok");
    assert_eq!(selector.backends().len(), 2);

    for seq in 2..=5 {
        common::send(&lb, &format!("1;{};100.0", seq)).await;
    }
    assert_eq!(old_log.lock().unwrap().len(), 1);
    let expected: Vec<BackendAddress> = fresh.iter().cycle().take(4).cloned().collect();
    assert_eq!(*new_log.lock().unwrap(), expected);
    shutdown.trigger();
}

#[tokio::test]
async fn malformed_config_keeps_current_set() {
    let log = common::data_log();
    let backend = common::start_mock_backend("free", log.clone()).await;
    let shutdown = Shutdown::new();
    let (lb, selector) = common::start_load_balancer(vec![backend.clone()], &shutdown).await;

    let reply = common::send(&lb, "config;nohost,127.0.0.1:9").await;
    assert!(reply.starts_with("error;"), "got {}", reply);
    assert_eq!(selector.backends().to_string(), backend.to_string());
    shutdown.trigger();
}

#[tokio::test]
async fn empty_config_makes_every_request_busy() {
    let log = common::data_log();
    let backend = common::start_mock_backend("free", log.clone()).await;
    let shutdown = Shutdown::new();
    let (lb, _) = common::start_load_balancer(vec![backend], &shutdown).await;

    assert_eq!(common::send(&lb, "config;").await, "ok");
    assert_eq!(common::send(&lb, "0;1;100.0").await, "busy");
    assert!(log.lock().unwrap().is_empty());
    shutdown.trigger();
}

#[tokio::test]
async fn balancer_answers_probes_and_rejects_garbage() {
    let shutdown = Shutdown::new();
    let (lb, _) = common::start_load_balancer(Vec::new(), &shutdown).await;

    assert_eq!(common::send(&lb, "ping").await, "free");
    assert!(common::send(&lb, "0;x;1.0").await.starts_with("error;"));
    shutdown.trigger();
}

#[tokio::test]
async fn failed_forward_closes_client_without_reply() {
    let log = common::data_log();
    let backend = common::start_vanishing_backend(log.clone()).await;
    let shutdown = Shutdown::new();
    let (lb, _) = common::start_load_balancer(vec![backend.clone()], &shutdown).await;

    let err = WireClient::default()
        .relay(&lb, "0;1;100.0")
        .await
        .unwrap_err();
    assert!(matches!(err, NetError::Frame { .. }), "got {}", err);
    assert_eq!(*log.lock().unwrap(), vec![backend]);

    // The balancer keeps serving.
    assert_eq!(common::send(&lb, "ping").await, "free");
    shutdown.trigger();
}

#[tokio::test]
async fn full_balancer_answers_busy() {
    let shutdown = Shutdown::new();
    let service = common::start_service(10, 400.0, &shutdown).await;
    let config = LoadBalancerConfig {
        backends: vec![service],
        queue_max_size: 1,
        ..LoadBalancerConfig::default()
    };
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let (lb, _) = common::start_load_balancer_with(listener, config, &shutdown);

    let in_flight = tokio::spawn({
        let lb = lb.clone();
        async move { common::send(&lb, "0;1;100.0").await }
    });
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(common::send(&lb, "ping").await, "busy");
    assert_eq!(common::send(&lb, "0;2;100.0").await, "busy");

    let msg: Message = in_flight.await.unwrap().parse().unwrap();
    assert!(msg.is_complete());
    common::settle().await;
    assert_eq!(common::send(&lb, "ping").await, "free");
    shutdown.trigger();
}
