//! Deterministic backend addresses for a cycle.
//!
//! A balancer listening on `host:P` owns the services on `service_host`
//! ports `P+1 ..= P+qts`. The same `qts` therefore always names the same
//! backends, and larger cycles extend smaller ones.

use crate::protocol::BackendAddress;

/// The `qts` backends a balancer should use.
pub fn backends_for(balancer: &BackendAddress, service_host: &str, qts: usize) -> Vec<BackendAddress> {
    (1..=qts)
        .filter_map(|offset| {
            let port = balancer.port as usize + offset;
            u16::try_from(port).ok()
        })
        .map(|port| BackendAddress::new(service_host, port))
        .collect()
}
