//! Per-request trace records and their CSV export.
//!
//! The column names are read by the offline analysis scripts and must not
//! change: `cycle,sourceLabel,sequenceIndex,t1,t2,t3,t4`, timestamps in
//! seconds.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::protocol::Message;

/// CSV header line.
pub const TRACE_HEADER: &str = "cycle,sourceLabel,sequenceIndex,t1,t2,t3,t4";

/// One completed round trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    /// The balancer the request went through.
    pub source_label: String,
    pub message: Message,
}

impl TraceRecord {
    pub fn new(source_label: impl Into<String>, message: Message) -> Self {
        Self {
            source_label: source_label.into(),
            message,
        }
    }

    /// The record as one CSV row, without terminator.
    pub fn to_csv_row(&self) -> String {
        let mut fields = vec![
            csv_field(self.message.cycle()),
            csv_field(&self.source_label),
            self.message.sequence().to_string(),
        ];
        fields.extend(self.message.raw_stamps().iter().cloned());
        fields.join(",")
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(&[',', '"', '\n'][..]) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Appends trace rows to a CSV file.
#[derive(Debug)]
pub struct TraceWriter {
    out: BufWriter<File>,
    rows: usize,
}

impl TraceWriter {
    /// Create (or truncate) `path` and write the header.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        writeln!(out, "{}", TRACE_HEADER)?;
        out.flush()?;
        Ok(Self { out, rows: 0 })
    }

    /// Rows written so far, header excluded.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append `records` and flush.
    pub fn append(&mut self, records: &[TraceRecord]) -> std::io::Result<()> {
        for record in records {
            writeln!(self.out, "{}", record.to_csv_row())?;
            self.rows += 1;
        }
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(cycle: &str, seq: u64) -> Message {
        format!("{};{};1.5;2.5;3.5;4.5", cycle, seq).parse().unwrap()
    }

    #[test]
    fn renders_rows_in_column_order() {
        let record = TraceRecord::new("127.0.0.1:2000", complete("0", 3));
        assert_eq!(record.to_csv_row(), "0,127.0.0.1:2000,3,1.5,2.5,3.5,4.5");
    }

    #[test]
    fn quotes_awkward_labels() {
        let record = TraceRecord::new("a,b", complete("warm \"up\"", 1));
        assert_eq!(
            record.to_csv_row(),
            "\"warm \"\"up\"\"\",\"a,b\",1,1.5,2.5,3.5,4.5"
        );
    }

    #[test]
    fn writes_header_and_rows() {
        let path = std::env::temp_dir().join(format!("trace-{}.csv", std::process::id()));
        let mut writer = TraceWriter::create(&path).unwrap();
        writer
            .append(&[
                TraceRecord::new("lb:1", complete("0", 1)),
                TraceRecord::new("lb:2", complete("0", 2)),
            ])
            .unwrap();
        assert_eq!(writer.rows(), 2);
        drop(writer);

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], TRACE_HEADER);
        assert_eq!(lines[2], "0,lb:2,2,1.5,2.5,3.5,4.5");
        let _ = std::fs::remove_file(path);
    }
}
