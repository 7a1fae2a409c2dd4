//! Bookkeeping for one experiment cycle.

use std::time::Duration;

use crate::source::trace::TraceRecord;

/// How one send-and-receive unit ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// A full four-stamp reply came back.
    Completed(TraceRecord),
    /// The balancer answered `busy`.
    Rejected,
    /// Connectivity failure or unusable reply; the request is lost.
    Failed(String),
}

/// One phase of the experiment with a fixed backend count.
#[derive(Debug, Clone)]
pub struct Cycle {
    label: String,
    qts: Option<usize>,
    responses: Vec<TraceRecord>,
    launched: usize,
    rejected: usize,
    lost: usize,
    complete: bool,
}

impl Cycle {
    /// A validation cycle driving `qts` backends.
    pub fn new(index: usize, qts: usize) -> Self {
        Self::labelled(index.to_string(), Some(qts))
    }

    /// A cycle identified by an arbitrary label.
    pub fn labelled(label: impl Into<String>, qts: Option<usize>) -> Self {
        Self {
            label: label.into(),
            qts,
            responses: Vec::new(),
            launched: 0,
            rejected: 0,
            lost: 0,
            complete: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Responses in completion order.
    pub fn responses(&self) -> &[TraceRecord] {
        &self.responses
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Count a launched request.
    pub fn launched(&mut self) {
        self.launched += 1;
    }

    /// Fold in the outcome of one unit.
    pub fn record(&mut self, outcome: SendOutcome) {
        match outcome {
            SendOutcome::Completed(record) => self.responses.push(record),
            SendOutcome::Rejected => self.rejected += 1,
            SendOutcome::Failed(_) => self.lost += 1,
        }
    }

    /// Count `n` units that never reported back.
    pub fn abandoned(&mut self, n: usize) {
        self.lost += n;
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn summary(&self, elapsed: Duration) -> CycleSummary {
        CycleSummary {
            label: self.label.clone(),
            qts: self.qts,
            launched: self.launched,
            collected: self.responses.len(),
            rejected: self.rejected,
            lost: self.lost,
            elapsed,
        }
    }

    /// Mean of t1→t2, t2→t3, t3→t4 and t1→t4 in milliseconds over the
    /// collected responses.
    pub fn mean_hops_ms(&self) -> Option<[f64; 4]> {
        if self.responses.is_empty() {
            return None;
        }
        let mut sums = [0.0; 4];
        let mut n = 0usize;
        for hops in self
            .responses
            .iter()
            .filter_map(|r| r.message.hop_latencies_ms())
        {
            sums[0] += hops[0];
            sums[1] += hops[1];
            sums[2] += hops[2];
            sums[3] += hops.iter().sum::<f64>();
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(sums.map(|s| s / n as f64))
    }
}

/// Counts reported when a cycle ends.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    pub label: String,
    pub qts: Option<usize>,
    pub launched: usize,
    pub collected: usize,
    pub rejected: usize,
    pub lost: usize,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Message;

    fn record(seq: u64, t: [f64; 4]) -> TraceRecord {
        let msg: Message = format!("0;{};{};{};{};{}", seq, t[0], t[1], t[2], t[3])
            .parse()
            .unwrap();
        TraceRecord::new("lb:1", msg)
    }

    #[test]
    fn tallies_outcomes() {
        let mut cycle = Cycle::new(0, 2);
        for _ in 0..4 {
            cycle.launched();
        }
        cycle.record(SendOutcome::Completed(record(2, [1.0, 1.0, 1.0, 1.0])));
        cycle.record(SendOutcome::Rejected);
        cycle.record(SendOutcome::Failed("reset".into()));
        cycle.abandoned(1);
        cycle.mark_complete();

        let summary = cycle.summary(Duration::from_secs(1));
        assert!(cycle.is_complete());
        assert_eq!(summary.label, "0");
        assert_eq!(summary.qts, Some(2));
        assert_eq!(
            (summary.launched, summary.collected, summary.rejected, summary.lost),
            (4, 1, 1, 2)
        );
    }

    #[test]
    fn averages_hops() {
        let mut cycle = Cycle::labelled("1", None);
        assert!(cycle.mean_hops_ms().is_none());
        cycle.record(SendOutcome::Completed(record(1, [0.0, 0.01, 0.03, 0.06])));
        cycle.record(SendOutcome::Completed(record(2, [0.0, 0.03, 0.05, 0.10])));

        let means = cycle.mean_hops_ms().unwrap();
        assert!((means[0] - 20.0).abs() < 1e-6);
        assert!((means[1] - 20.0).abs() < 1e-6);
        assert!((means[2] - 40.0).abs() < 1e-6);
        assert!((means[3] - 80.0).abs() < 1e-6);
    }
}
