//! Progress reporting.
//!
//! Reporters observe a run; they never influence it. [`ConsoleReporter`]
//! prints the running count every [`DEFAULT_REPORT_INTERVAL`] partitions and a
//! two-line summary at the end.

use std::io::Write;

use tickler_types::PartitionKeyTuple;
use tracing::warn;

use crate::error::RepairError;

/// Partitions between two progress lines.
pub const DEFAULT_REPORT_INTERVAL: u64 = 1000;

/// Observer of a repair run.
pub trait ProgressReporter {
    /// Called after each partition, with the number processed so far.
    fn on_tuple_processed(&mut self, row_count: u64);

    /// Called when a partition is skipped under the continue policy.
    fn on_partition_failed(&mut self, _partition_key: &PartitionKeyTuple, _error: &RepairError) {}

    /// Called once when enumeration is exhausted.
    fn on_completion(&mut self, table: &str, row_count: u64);

    /// Called after completion when some partitions were skipped.
    fn on_failures(&mut self, _failed: &[PartitionKeyTuple]) {}
}

/// Writes progress in the tool's plain-text output format.
pub struct ConsoleReporter<W: Write> {
    out: W,
    interval: u64,
}

impl<W: Write> ConsoleReporter<W> {
    /// Report to `out` every [`DEFAULT_REPORT_INTERVAL`] partitions.
    pub fn new(out: W) -> Self {
        Self::with_interval(out, DEFAULT_REPORT_INTERVAL)
    }

    /// Report to `out` every `interval` partitions. Zero disables the
    /// periodic line.
    pub fn with_interval(out: W, interval: u64) -> Self {
        Self { out, interval }
    }

    /// Return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: std::fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(line).and_then(|_| self.out.flush()) {
            warn!(error = %e, "failed to write progress");
        }
    }
}

impl<W: Write> ProgressReporter for ConsoleReporter<W> {
    fn on_tuple_processed(&mut self, row_count: u64) {
        if self.interval > 0 && row_count % self.interval == 0 {
            self.emit(format_args!("{row_count}\n"));
        }
    }

    fn on_completion(&mut self, table: &str, row_count: u64) {
        self.emit(format_args!("Repair of table {table} complete\n"));
        self.emit(format_args!("{row_count} rows read and repaired\n"));
    }

    fn on_failures(&mut self, failed: &[PartitionKeyTuple]) {
        self.emit(format_args!("{} partitions could not be repaired:\n", failed.len()));
        for partition_key in failed {
            self.emit(format_args!("  {partition_key}\n"));
        }
    }
}
