//! Latency experiment harness.
//!
//! # Architecture Overview
//!
//! ```text
//!  ┌────────┐  config;h:p,...   ┌──────────────┐   ping / data   ┌─────────┐
//!  │ Source │──────────────────▶│ LoadBalancer │────────────────▶│ Service │ × N
//!  │        │  cycle;seq;t1     │  stamps t2   │                 │ t3, t4  │
//!  │        │◀──────────────────│  relays      │◀────────────────│         │
//!  └───┬────┘  ...;t2;t3;t4     └──────────────┘                 └─────────┘
//!      │
//!      ▼
//!   trace.csv  (cycle,sourceLabel,sequenceIndex,t1,t2,t3,t4)
//! ```
//!
//! One binary, three roles, chosen by subcommand.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use latency_harness::config::loader::{read_config, ConfigError};
use latency_harness::config::validation::validate_config;
use latency_harness::config::HarnessConfig;
use latency_harness::lifecycle::{signals, Shutdown};
use latency_harness::net::{Listener, WireClient};
use latency_harness::observability::init_logging;
use latency_harness::protocol::BackendAddress;
use latency_harness::resilience::timeouts::Timeouts;
use latency_harness::{LoadBalancer, Service, Source};

#[derive(Parser)]
#[command(name = "latency-harness")]
#[command(about = "Source / LoadBalancer / Service latency experiment", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Role,
}

#[derive(Subcommand)]
enum Role {
    /// Drive the experiment cycles.
    Source,
    /// Run a LoadBalancer.
    #[command(name = "load_balance")]
    LoadBalance {
        port: u16,
        /// Initial backends, `host:port,host:port`.
        backends: Option<String>,
    },
    /// Run a Service worker.
    Service {
        port: u16,
        /// Mean simulated processing time in milliseconds.
        service_time_ms: f64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => HarnessConfig::default(),
    };
    apply_overrides(&mut config, &cli.command)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "latency-harness starting");

    let shutdown = Shutdown::new();
    signals::install(shutdown.clone());
    let client = WireClient::new(Timeouts::from(&config.timeouts));

    match cli.command {
        Role::Source => {
            let mut source = Source::new(config.source, config.retries, client)?;
            let mut stop = shutdown.subscribe();
            let finished = tokio::select! {
                result = source.run() => Some(result?),
                _ = stop.recv() => None,
            };
            match finished {
                Some(summaries) => tracing::info!(
                    cycles = summaries.len(),
                    trace_rows = source.trace_rows(),
                    "Experiment finished"
                ),
                None => tracing::info!("Experiment interrupted"),
            }
        }
        Role::LoadBalance { .. } => {
            let listener = Listener::bind(&config.load_balancer.listener).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            LoadBalancer::new(&config.load_balancer, client)
                .run(listener, shutdown.subscribe())
                .await;
        }
        Role::Service { .. } => {
            let listener = Listener::bind(&config.service.listener).await?;
            tracing::info!(address = %listener.local_addr()?, "Listening for connections");
            Service::new(&config.service)
                .run(listener, shutdown.subscribe())
                .await;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Command-line values take precedence over the file.
fn apply_overrides(config: &mut HarnessConfig, role: &Role) -> Result<(), Box<dyn std::error::Error>> {
    match role {
        Role::Source => {}
        Role::LoadBalance { port, backends } => {
            let lb = &mut config.load_balancer;
            lb.listener = lb.listener.with_port(*port);
            if let Some(list) = backends {
                lb.backends = BackendAddress::parse_list(list)?;
            }
        }
        Role::Service { port, service_time_ms } => {
            let service = &mut config.service;
            service.listener = service.listener.with_port(*port);
            service.service_time_ms = *service_time_ms;
        }
    }
    Ok(())
}
