//! The Source: configures balancers, emits timed requests, collects replies.

use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{self, Instant};

use crate::config::{RetryConfig, SourceConfig};
use crate::net::WireClient;
use crate::protocol::{clock, BackendAddress, Message, Reply, Request};
use crate::resilience::backoff::calculate_backoff;
use crate::source::cycle::{Cycle, CycleSummary, SendOutcome};
use crate::source::naming::backends_for;
use crate::source::trace::{TraceRecord, TraceWriter};

/// Errors that end a Source run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open trace file {path}: {source}")]
    TraceOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write trace rows: {0}")]
    TraceWrite(#[source] std::io::Error),
}

/// Load generator state for one run.
pub struct Source {
    config: SourceConfig,
    retries: RetryConfig,
    client: WireClient,
    trace: Option<TraceWriter>,
}

impl Source {
    /// Build a Source, creating the trace file when one is configured.
    pub fn new(
        config: SourceConfig,
        retries: RetryConfig,
        client: WireClient,
    ) -> Result<Self, SourceError> {
        let trace = match &config.trace_path {
            Some(path) => Some(TraceWriter::create(path).map_err(|source| {
                SourceError::TraceOpen {
                    path: path.clone(),
                    source,
                }
            })?),
            None => None,
        };
        Ok(Self {
            config,
            retries,
            client,
            trace,
        })
    }

    /// Rows written to the trace so far.
    pub fn trace_rows(&self) -> usize {
        self.trace.as_ref().map_or(0, TraceWriter::rows)
    }

    /// Run the configured mode to completion.
    pub async fn run(&mut self) -> Result<Vec<CycleSummary>, SourceError> {
        tracing::info!(
            source_port = self.config.source_port,
            feeding = self.config.model_feeding_stage,
            "Source starting"
        );
        if self.config.model_feeding_stage {
            self.run_feeding().await.map(|summary| vec![summary])
        } else {
            self.run_validation().await
        }
    }

    /// Fixed-count baseline against the target, cycle label `1`.
    async fn run_feeding(&mut self) -> Result<CycleSummary, SourceError> {
        let target = [self.config.target()];
        let mut cycle = Cycle::labelled("1", None);
        let delay = Duration::from_millis(self.config.feeding_delay_ms);
        let summary = self
            .drive(&mut cycle, &target, self.config.feeding_requests, delay)
            .await?;

        match cycle.mean_hops_ms() {
            Some([lb, dispatch, service, total]) => tracing::info!(
                collected = summary.collected,
                t1_t2_ms = lb,
                t2_t3_ms = dispatch,
                t3_t4_ms = service,
                t1_t4_ms = total,
                "Feeding stage finished"
            ),
            None => tracing::warn!(
                launched = summary.launched,
                "Feeding stage finished without responses"
            ),
        }
        Ok(summary)
    }

    async fn run_validation(&mut self) -> Result<Vec<CycleSummary>, SourceError> {
        let balancers = self.config.balancers();
        let per_cycle = self.config.max_considered_messages_expected;
        let delay = Duration::from_millis(self.config.arrival_delay);
        let cycles = self.config.qtd_services.clone();
        let mut summaries = Vec::with_capacity(cycles.len());

        for (index, qts) in cycles.into_iter().enumerate() {
            tracing::info!(cycle = index, qts, "Cycle starting");
            let configured = self.configure_balancers(&balancers, qts).await;
            if configured.is_empty() {
                tracing::error!(cycle = index, qts, "No balancer accepted the configuration, cycle sends nothing");
            }

            let mut cycle = Cycle::new(index, qts);
            let summary = self.drive(&mut cycle, &configured, per_cycle, delay).await?;
            summaries.push(summary);
        }
        Ok(summaries)
    }

    /// Point every balancer at its first `qts` services.
    ///
    /// Returns the balancers that acknowledged. A balancer that stays
    /// unreachable after all attempts is skipped.
    pub async fn configure_balancers(
        &self,
        balancers: &[BackendAddress],
        qts: usize,
    ) -> Vec<BackendAddress> {
        let mut configured = Vec::with_capacity(balancers.len());
        for balancer in balancers {
            let backends = backends_for(balancer, &self.config.service_host, qts);
            if self.deliver_config(balancer, backends).await {
                configured.push(balancer.clone());
            }
        }

        if self.config.settle_delay_ms > 0 {
            time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }
        configured
    }

    async fn deliver_config(&self, balancer: &BackendAddress, backends: Vec<BackendAddress>) -> bool {
        let request = Request::Reconfigure(backends);
        let attempts = self.config.config_retries.max(1);

        for attempt in 1..=attempts {
            match self.client.send(balancer, &request).await {
                Ok(Reply::Ok) => {
                    tracing::info!(balancer = %balancer, request = %request, "Balancer configured");
                    return true;
                }
                Ok(Reply::Error(reason)) => {
                    tracing::error!(balancer = %balancer, reason = %reason, "Balancer rejected configuration");
                    return false;
                }
                Ok(other) => {
                    tracing::warn!(balancer = %balancer, reply = %other, attempt, "Unexpected configuration reply");
                }
                Err(e) => {
                    tracing::warn!(balancer = %balancer, error = %e, attempt, "Configuration delivery failed");
                }
            }
            if attempt < attempts {
                time::sleep(calculate_backoff(attempt, &self.retries)).await;
            }
        }

        tracing::error!(balancer = %balancer, attempts, "Balancer unreachable, skipping");
        false
    }

    /// Launch `count` requests spread over `balancers`, wait for them under
    /// the cycle deadline, then record the results.
    async fn drive(
        &mut self,
        cycle: &mut Cycle,
        balancers: &[BackendAddress],
        count: usize,
        delay: Duration,
    ) -> Result<CycleSummary, SourceError> {
        let started = Instant::now();
        let mut units = JoinSet::new();

        if !balancers.is_empty() {
            for seq in 1..=count {
                let balancer = balancers[(seq - 1) % balancers.len()].clone();
                let message = Message::new(cycle.label(), seq as u64, clock::now_secs());
                units.spawn(send_unit(self.client, balancer, message));
                cycle.launched();
                if seq < count {
                    time::sleep(delay).await;
                }
            }
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.cycle_timeout_ms);
        loop {
            match time::timeout_at(deadline, units.join_next()).await {
                Ok(Some(Ok(outcome))) => cycle.record(outcome),
                Ok(Some(Err(e))) => cycle.record(SendOutcome::Failed(e.to_string())),
                Ok(None) => break,
                Err(_) => {
                    let pending = units.len();
                    tracing::warn!(cycle = %cycle.label(), pending, "Cycle deadline reached, abandoning requests");
                    units.abort_all();
                    cycle.abandoned(pending);
                    break;
                }
            }
        }
        cycle.mark_complete();

        if let Some(trace) = self.trace.as_mut() {
            trace.append(cycle.responses()).map_err(SourceError::TraceWrite)?;
        }

        let summary = cycle.summary(started.elapsed());
        tracing::info!(
            cycle = %summary.label,
            qts = ?summary.qts,
            launched = summary.launched,
            collected = summary.collected,
            busy = summary.rejected,
            lost = summary.lost,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Cycle complete"
        );
        Ok(summary)
    }
}

/// One request, one reply.
async fn send_unit(client: WireClient, balancer: BackendAddress, message: Message) -> SendOutcome {
    let cycle = message.cycle().to_string();
    let sequence = message.sequence();

    match client.send(&balancer, &Request::Data(message)).await {
        Ok(Reply::Data(reply))
            if reply.is_complete() && reply.cycle() == cycle && reply.sequence() == sequence =>
        {
            tracing::debug!(balancer = %balancer, response = %reply, "Response received");
            SendOutcome::Completed(TraceRecord::new(balancer.to_string(), reply))
        }
        Ok(Reply::Busy) => {
            tracing::debug!(balancer = %balancer, cycle = %cycle, sequence, "Request rejected");
            SendOutcome::Rejected
        }
        Ok(other) => {
            tracing::warn!(balancer = %balancer, cycle = %cycle, sequence, reply = %other, "Unusable reply");
            SendOutcome::Failed(format!("unusable reply: {}", other))
        }
        Err(e) => {
            tracing::warn!(balancer = %balancer, cycle = %cycle, sequence, error = %e, "Request lost");
            SendOutcome::Failed(e.to_string())
        }
    }
}
