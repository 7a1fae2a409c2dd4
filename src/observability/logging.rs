//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber once per process
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level when set
//! - Human-readable fmt output; the CSV trace is the machine-readable record

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter directive in effect: `RUST_LOG` when set, else `log_level`.
pub fn filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
}

/// Initialise logging. Later calls are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let _ = tracing_subscriber::registry()
        .with(filter(config))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init();
}
