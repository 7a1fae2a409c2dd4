//! Latency experiment harness: Source, LoadBalancer and Service roles
//! exchanging timestamped text messages over TCP.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod protocol;
pub mod resilience;
pub mod service;
pub mod source;

pub use config::HarnessConfig;
pub use lifecycle::Shutdown;
pub use load_balancer::LoadBalancer;
pub use service::Service;
pub use source::Source;
