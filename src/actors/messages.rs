//! Message types for actor communication
//!
//! Data moves through two typed channels:
//!
//! 1. **Work**: `Arc<Check>` from the scheduler to the dispatcher
//! 2. **Results**: [`CheckResult`] from the dispatcher to the aggregator
//!
//! Control messages go over per-actor command channels with oneshot replies.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::check::{Check, CheckResult};
use crate::stats::DomainStatsMap;

pub type WorkSender = mpsc::Sender<Arc<Check>>;
pub type WorkReceiver = mpsc::Receiver<Arc<Check>>;
pub type ResultSender = mpsc::Sender<CheckResult>;
pub type ResultReceiver = mpsc::Receiver<CheckResult>;

/// Commands that can be sent to the SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Enqueue a full sweep immediately, outside the tick cadence
    SweepNow {
        /// Receives `true` once every check was enqueued
        respond_to: oneshot::Sender<bool>,
    },
}

/// Commands that can be sent to the AggregatorActor
#[derive(Debug)]
pub enum AggregatorCommand {
    /// Copy of the current per-domain counters
    Snapshot {
        respond_to: oneshot::Sender<AggregatorSnapshot>,
    },
}

/// Aggregator state at the time of a snapshot
#[derive(Debug, Clone)]
pub struct AggregatorSnapshot {
    pub stats: DomainStatsMap,

    /// Number of reports emitted so far
    pub rounds: u64,

    /// Results consumed since the last report
    pub pending: usize,
}
