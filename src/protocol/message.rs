//! Data messages: `cycle;sequence;t1[;t2[;t3[;t4]]]`.
//!
//! Each hop appends exactly one timestamp and never touches the ones before
//! it. Stamps are kept as the text they arrived as so a relay is
//! byte-for-byte faithful.

use std::fmt;
use std::str::FromStr;

use crate::protocol::{clock, ProtocolError};

/// Number of timestamps in a completed round trip.
pub const MAX_STAMPS: usize = 4;

/// A data message travelling Source → LoadBalancer → Service and back.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    cycle: String,
    sequence: u64,
    stamps: Vec<String>,
}

impl Message {
    /// A fresh message carrying only the send time `t1`.
    pub fn new(cycle: impl Into<String>, sequence: u64, t1: f64) -> Self {
        Self {
            cycle: cycle.into(),
            sequence,
            stamps: vec![clock::format_secs(t1)],
        }
    }

    pub fn cycle(&self) -> &str {
        &self.cycle
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Timestamps in hop order, as text.
    pub fn raw_stamps(&self) -> &[String] {
        &self.stamps
    }

    /// Timestamps in hop order, in seconds.
    pub fn stamps(&self) -> Vec<f64> {
        // Every stored stamp was validated on the way in.
        self.stamps
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    /// True once all four hops have stamped the message.
    pub fn is_complete(&self) -> bool {
        self.stamps.len() == MAX_STAMPS
    }

    /// Append a timestamp for the current hop.
    pub fn push_stamp(&mut self, secs: f64) -> Result<(), ProtocolError> {
        if self.stamps.len() >= MAX_STAMPS {
            return Err(ProtocolError::TooManyTimestamps(self.stamps.len()));
        }
        self.stamps.push(clock::format_secs(secs));
        Ok(())
    }

    /// Append the current wall-clock time.
    pub fn stamp_now(&mut self) -> Result<(), ProtocolError> {
        self.push_stamp(clock::now_secs())
    }

    /// Per-hop latencies in milliseconds: t1→t2, t2→t3, t3→t4.
    /// `None` until the message is complete.
    pub fn hop_latencies_ms(&self) -> Option<[f64; 3]> {
        if !self.is_complete() {
            return None;
        }
        let t = self.stamps();
        Some([
            (t[1] - t[0]) * 1000.0,
            (t[2] - t[1]) * 1000.0,
            (t[3] - t[2]) * 1000.0,
        ])
    }

    /// Full round trip t1→t4 in milliseconds.
    pub fn round_trip_ms(&self) -> Option<f64> {
        self.hop_latencies_ms().map(|hops| hops.iter().sum())
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::Empty);
        }
        // Older peers terminate every field with ';'.
        let body = s.strip_suffix(';').unwrap_or(s);

        let fields: Vec<&str> = body.split(';').map(str::trim).collect();
        if fields.len() < 3 || fields[0].is_empty() {
            return Err(ProtocolError::MissingFields(s.to_string()));
        }

        let sequence = fields[1]
            .parse::<u64>()
            .map_err(|_| ProtocolError::InvalidSequence(fields[1].to_string()))?;

        let stamps = &fields[2..];
        if stamps.len() > MAX_STAMPS {
            return Err(ProtocolError::TooManyTimestamps(stamps.len()));
        }
        for stamp in stamps {
            match stamp.parse::<f64>() {
                Ok(v) if v.is_finite() => {}
                _ => return Err(ProtocolError::InvalidTimestamp(stamp.to_string())),
            }
        }

        Ok(Self {
            cycle: fields[0].to_string(),
            sequence,
            stamps: stamps.iter().map(|s| s.to_string()).collect(),
        })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.cycle, self.sequence)?;
        for stamp in &self.stamps {
            write!(f, ";{}", stamp)?;
        }
        Ok(())
    }
}
