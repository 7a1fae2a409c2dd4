//! Configuration schema definitions.
//!
//! One file configures all three roles; each process only reads the section
//! for the role it was started as. All types derive Serde traits for
//! deserialization from TOML.

use serde::{Deserialize, Serialize};

use crate::protocol::BackendAddress;

/// Root configuration for the harness.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Load generator settings.
    pub source: SourceConfig,

    /// Balancer settings.
    pub load_balancer: LoadBalancerConfig,

    /// Worker settings.
    pub service: ServiceConfig,

    /// Timeouts for every outbound exchange.
    pub timeouts: TimeoutConfig,

    /// Backoff used when delivering reconfiguration messages.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:2000").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl ListenerConfig {
    /// Same listener, bound to another port on the same interface.
    pub fn with_port(&self, port: u16) -> Self {
        let host = self
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host)
            .unwrap_or("0.0.0.0");
        Self {
            bind_address: format!("{}:{}", host, port),
            max_connections: self.max_connections,
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:2000".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Source (load generator) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Run the fixed-count baseline instead of the cycle experiment.
    pub model_feeding_stage: bool,

    /// Port the Source identifies itself with in logs.
    pub source_port: u16,

    /// Fixed target for feeding mode, and fallback balancer.
    pub target_ip: String,
    pub target_port: u16,

    /// Requests issued per cycle.
    pub max_considered_messages_expected: usize,

    /// Inter-arrival delay between requests in milliseconds.
    pub arrival_delay: u64,

    /// Backend count for each cycle, in order.
    pub qtd_services: Vec<usize>,

    /// Balancers that receive reconfiguration and data traffic.
    pub loadbalancer_addresses: Vec<BackendAddress>,

    /// Host on which every balancer's services listen.
    pub service_host: String,

    /// Number of requests sent in feeding mode.
    pub feeding_requests: usize,

    /// Delay between feeding-mode requests in milliseconds.
    pub feeding_delay_ms: u64,

    /// Deadline for the end-of-cycle barrier in milliseconds.
    pub cycle_timeout_ms: u64,

    /// Attempts made to deliver a reconfiguration message.
    pub config_retries: u32,

    /// Pause after reconfiguring, before the cycle's first request.
    pub settle_delay_ms: u64,

    /// CSV file receiving every completed round trip.
    pub trace_path: Option<String>,
}

impl SourceConfig {
    /// The fixed target as an address.
    pub fn target(&self) -> BackendAddress {
        BackendAddress::new(self.target_ip.clone(), self.target_port)
    }

    /// Balancers to drive; the fixed target when none are listed.
    pub fn balancers(&self) -> Vec<BackendAddress> {
        if self.loadbalancer_addresses.is_empty() {
            vec![self.target()]
        } else {
            self.loadbalancer_addresses.clone()
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            model_feeding_stage: false,
            source_port: 1025,
            target_ip: "127.0.0.1".to_string(),
            target_port: 2000,
            max_considered_messages_expected: 10,
            arrival_delay: 100,
            qtd_services: vec![1, 2],
            loadbalancer_addresses: Vec::new(),
            service_host: "127.0.0.1".to_string(),
            feeding_requests: 10,
            feeding_delay_ms: 2000,
            cycle_timeout_ms: 30_000,
            config_retries: 5,
            settle_delay_ms: 0,
            trace_path: None,
        }
    }
}

/// LoadBalancer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadBalancerConfig {
    pub listener: ListenerConfig,

    /// Backends used until the first reconfiguration.
    pub backends: Vec<BackendAddress>,

    /// Data requests allowed in flight through this balancer at once.
    pub queue_max_size: usize,
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            backends: vec![
                BackendAddress::new("127.0.0.1", 2001),
                BackendAddress::new("127.0.0.1", 2002),
            ],
            queue_max_size: 1000,
        }
    }
}

/// Service (worker) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub listener: ListenerConfig,

    /// Mean simulated processing time in milliseconds.
    pub service_time_ms: f64,

    /// Standard deviation of the processing time in milliseconds.
    pub service_time_std_ms: f64,

    /// Admission capacity K.
    pub queue_max_size: usize,

    /// Optional external advisory call made while processing.
    pub advisor: AdvisorConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig {
                bind_address: "0.0.0.0:2001".to_string(),
                ..ListenerConfig::default()
            },
            service_time_ms: 50.0,
            service_time_std_ms: 0.0,
            queue_max_size: 10,
            advisor: AdvisorConfig::default(),
        }
    }
}

/// Chat-completion endpoint asked a question while a request is processed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Endpoint URL. The advisor is disabled when unset.
    pub endpoint: Option<String>,

    /// Model name sent with the question.
    pub model: String,

    /// The question asked.
    pub question: String,

    /// Environment variable holding the bearer token.
    pub api_key_env: String,

    /// Timeout for the call in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "llama-3.3-70b-versatile".to_string(),
            question: "Why are distributed systems complex?".to_string(),
            api_key_env: "ADVISOR_API_KEY".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Timeout configuration for outbound exchanges.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Probe round trip timeout in milliseconds.
    pub probe_ms: u64,

    /// Data round trip timeout in milliseconds.
    pub request_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 1000,
            probe_ms: 500,
            request_ms: 30_000,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 500,
            max_delay_ms: 4000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "latency_harness=info".to_string(),
        }
    }
}
