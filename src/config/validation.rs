//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacities > 0, timeouts > 0, ports valid)
//! - Check that derived service ports fit for every configured cycle
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HarnessConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{HarnessConfig, ListenerConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every section, collecting all problems.
pub fn validate_config(config: &HarnessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let source = &config.source;
    if source.max_considered_messages_expected == 0 {
        errors.push(ValidationError::new(
            "source.max_considered_messages_expected",
            "must be greater than 0",
        ));
    }
    if source.target_port == 0 {
        errors.push(ValidationError::new("source.target_port", "must be a valid port"));
    }
    if !source.model_feeding_stage && source.qtd_services.is_empty() {
        errors.push(ValidationError::new(
            "source.qtd_services",
            "at least one cycle is required",
        ));
    }
    if source.model_feeding_stage && source.feeding_requests == 0 {
        errors.push(ValidationError::new(
            "source.feeding_requests",
            "must be greater than 0",
        ));
    }
    if source.cycle_timeout_ms == 0 {
        errors.push(ValidationError::new("source.cycle_timeout_ms", "must be greater than 0"));
    }
    if source.config_retries == 0 {
        errors.push(ValidationError::new("source.config_retries", "must be at least 1"));
    }
    let widest = source.qtd_services.iter().copied().max().unwrap_or(0);
    for lb in source.balancers() {
        if lb.port as usize + widest > u16::MAX as usize {
            errors.push(ValidationError::new(
                "source.qtd_services",
                format!("{} backends do not fit above balancer port {}", widest, lb.port),
            ));
        }
    }

    validate_listener("load_balancer.listener", &config.load_balancer.listener, &mut errors);
    if config.load_balancer.queue_max_size == 0 {
        errors.push(ValidationError::new(
            "load_balancer.queue_max_size",
            "must be greater than 0",
        ));
    }

    let service = &config.service;
    validate_listener("service.listener", &service.listener, &mut errors);
    if service.queue_max_size == 0 {
        errors.push(ValidationError::new("service.queue_max_size", "must be greater than 0"));
    }
    if !service.service_time_ms.is_finite() || service.service_time_ms < 0.0 {
        errors.push(ValidationError::new(
            "service.service_time_ms",
            "must be a non-negative number",
        ));
    }
    if !service.service_time_std_ms.is_finite() || service.service_time_std_ms < 0.0 {
        errors.push(ValidationError::new(
            "service.service_time_std_ms",
            "must be a non-negative number",
        ));
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("timeouts.connect_ms", timeouts.connect_ms),
        ("timeouts.probe_ms", timeouts.probe_ms),
        ("timeouts.request_ms", timeouts.request_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.retries.base_delay_ms > config.retries.max_delay_ms {
        errors.push(ValidationError::new(
            "retries.base_delay_ms",
            "must not exceed retries.max_delay_ms",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_listener(field: &str, listener: &ListenerConfig, errors: &mut Vec<ValidationError>) {
    if listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            format!("{}.bind_address", field),
            format!("{:?} is not a socket address", listener.bind_address),
        ));
    }
    if listener.max_connections == 0 {
        errors.push(ValidationError::new(
            format!("{}.max_connections", field),
            "must be greater than 0",
        ));
    }
}
