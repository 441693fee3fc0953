//! Report sinks
//!
//! The aggregator hands every finished round to a [`ReportSink`]. The binary
//! prints to stdout; tests collect reports through a channel.

use std::io::Write;

use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::stats::Report;

pub trait ReportSink: Send + Sync {
    fn emit(&self, report: &Report);
}

/// Writes one line per domain to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn emit(&self, report: &Report) {
        let mut stdout = std::io::stdout().lock();
        for line in &report.lines {
            if let Err(e) = writeln!(stdout, "{line}") {
                error!("failed to write report: {e}");
                return;
            }
        }
        let _ = stdout.flush();
    }
}

impl ReportSink for mpsc::UnboundedSender<Report> {
    fn emit(&self, report: &Report) {
        if self.send(report.clone()).is_err() {
            warn!("report receiver dropped, discarding round {}", report.round);
        }
    }
}
