//! SchedulerActor - re-enqueues every check at a fixed cadence
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → for each check: send Arc<Check> → work channel → Dispatcher
//!     ↑
//!     └─── Commands (SweepNow) / cancellation token
//! ```
//!
//! The work channel is bounded and sends wait for capacity: a probe is never
//! dropped to keep the tick on time.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, trace, warn};

use crate::check::Check;

use super::messages::{SchedulerCommand, WorkSender};

pub struct SchedulerActor {
    /// Checks in configuration order
    checks: Arc<[Arc<Check>]>,

    work_tx: WorkSender,

    command_rx: mpsc::Receiver<SchedulerCommand>,

    interval_duration: Duration,

    token: CancellationToken,
}

impl SchedulerActor {
    pub fn new(
        checks: Arc<[Arc<Check>]>,
        work_tx: WorkSender,
        command_rx: mpsc::Receiver<SchedulerCommand>,
        interval_duration: Duration,
        token: CancellationToken,
    ) -> Self {
        Self {
            checks,
            work_tx,
            command_rx,
            interval_duration,
            token,
        }
    }

    /// Run until the token is cancelled or the work channel closes.
    ///
    /// The first tick fires immediately.
    #[instrument(skip(self), fields(checks = self.checks.len()))]
    pub async fn run(mut self) {
        debug!("starting scheduler with interval {:?}", self.interval_duration);

        let mut ticker = interval(self.interval_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.token.cancelled() => {
                    debug!("cancelled");
                    break;
                }

                tick = ticker.tick() => {
                    trace!("tick at {tick:?}");
                    if !self.sweep().await {
                        break;
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        SchedulerCommand::SweepNow { respond_to } => {
                            debug!("received SweepNow command");
                            let completed = self.sweep().await;
                            let _ = respond_to.send(completed);
                            if !completed {
                                break;
                            }
                        }
                    }
                }
            }
        }

        debug!("scheduler stopped");
    }

    /// Enqueue every check once, in order. Returns `false` when the sweep was
    /// interrupted by cancellation or a closed work channel.
    async fn sweep(&self) -> bool {
        for check in self.checks.iter() {
            tokio::select! {
                biased;

                _ = self.token.cancelled() => {
                    debug!("cancelled mid-sweep");
                    return false;
                }

                sent = self.work_tx.send(Arc::clone(check)) => {
                    if sent.is_err() {
                        warn!("work channel closed, stopping scheduler");
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Handle for a spawned SchedulerActor
pub struct SchedulerHandle {
    sender: mpsc::Sender<SchedulerCommand>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn spawn(
        checks: Arc<[Arc<Check>]>,
        work_tx: WorkSender,
        interval_duration: Duration,
        token: CancellationToken,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SchedulerActor::new(checks, work_tx, cmd_rx, interval_duration, token);
        let task = tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            task,
        }
    }

    /// Enqueue a full sweep right now. Resolves once every check is queued.
    pub async fn sweep_now(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(SchedulerCommand::SweepNow { respond_to: tx })
            .await
            .context("failed to send SweepNow command")?;

        rx.await.context("failed to receive response")
    }

    /// Wait for the actor to stop
    pub async fn join(self) -> Result<()> {
        self.task.await.context("scheduler task failed")
    }
}
