//! AggregatorActor - folds probe results into per-domain availability
//!
//! The aggregator is the only writer of the stats map. Other components never
//! touch it: they send results over the result channel and read it through
//! snapshot commands.
//!
//! ## Message Flow
//!
//! ```text
//! result channel → record(domain, success) → every N results → Report → sink
//!     ↑
//!     └─── Commands (Snapshot)
//! ```
//!
//! N is the number of configured checks (one round). When probes back up, a
//! round can straddle two scheduler ticks; reports follow results, not ticks.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace};

use crate::check::CheckResult;
use crate::config::CounterMode;
use crate::report::ReportSink;
use crate::stats::DomainStatsMap;

use super::messages::{AggregatorCommand, AggregatorSnapshot, ResultReceiver};

pub struct AggregatorActor {
    stats: DomainStatsMap,

    /// Results per round
    round_size: usize,

    /// Results consumed since the last report
    pending: usize,

    rounds: u64,

    mode: CounterMode,

    result_rx: ResultReceiver,

    command_rx: mpsc::Receiver<AggregatorCommand>,

    sink: Arc<dyn ReportSink>,
}

impl AggregatorActor {
    pub fn new(
        stats: DomainStatsMap,
        round_size: usize,
        mode: CounterMode,
        result_rx: ResultReceiver,
        command_rx: mpsc::Receiver<AggregatorCommand>,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        Self {
            stats,
            round_size: round_size.max(1),
            pending: 0,
            rounds: 0,
            mode,
            result_rx,
            command_rx,
            sink,
        }
    }

    /// Run until every result sender is gone, then return the final counters.
    ///
    /// Results already queued when the dispatcher stops are still aggregated.
    #[instrument(skip(self), fields(round_size = self.round_size, mode = ?self.mode))]
    pub async fn run(mut self) -> DomainStatsMap {
        debug!("starting aggregator for {} domains", self.stats.len());

        loop {
            tokio::select! {
                result = self.result_rx.recv() => match result {
                    Some(result) => self.handle_result(result),
                    None => {
                        debug!("result channel closed");
                        break;
                    }
                },

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AggregatorCommand::Snapshot { respond_to } => {
                            let _ = respond_to.send(self.snapshot());
                        }
                    }
                }
            }
        }

        if self.pending > 0 {
            debug!(
                "{} results of an unfinished round were counted but not reported",
                self.pending
            );
        }

        debug!("aggregator stopped after {} rounds", self.rounds);
        self.stats
    }

    fn handle_result(&mut self, result: CheckResult) {
        trace!(
            "{} ({}) success: {}",
            result.check.name,
            result.domain(),
            result.success
        );

        self.stats.record(result.domain(), result.success);
        self.pending += 1;

        if self.pending >= self.round_size {
            self.finish_round();
        }
    }

    fn finish_round(&mut self) {
        self.pending = 0;
        self.rounds += 1;

        let report = self.stats.report(self.rounds);
        for line in &report.lines {
            debug!("{} up: {} total: {}", line.domain, line.up, line.total);
        }
        self.sink.emit(&report);

        if self.mode == CounterMode::Rolling {
            self.stats.reset();
        }
    }

    fn snapshot(&self) -> AggregatorSnapshot {
        AggregatorSnapshot {
            stats: self.stats.clone(),
            rounds: self.rounds,
            pending: self.pending,
        }
    }
}

/// Handle for a spawned AggregatorActor
pub struct AggregatorHandle {
    sender: mpsc::Sender<AggregatorCommand>,
    task: JoinHandle<DomainStatsMap>,
}

impl AggregatorHandle {
    pub fn spawn(
        stats: DomainStatsMap,
        round_size: usize,
        mode: CounterMode,
        result_rx: ResultReceiver,
        sink: Arc<dyn ReportSink>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = AggregatorActor::new(stats, round_size, mode, result_rx, cmd_rx, sink);

        Self {
            sender: cmd_tx,
            task: tokio::spawn(actor.run()),
        }
    }

    pub async fn snapshot(&self) -> Result<AggregatorSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(AggregatorCommand::Snapshot { respond_to: tx })
            .await
            .context("failed to send Snapshot command")?;

        rx.await.context("failed to receive response")
    }

    /// Wait for the actor to drain its queue and return the final counters
    pub async fn join(self) -> Result<DomainStatsMap> {
        self.task.await.context("aggregator task failed")
    }
}
