//! DispatcherActor - runs probes for queued checks
//!
//! ## Message Flow
//!
//! ```text
//! work channel → acquire worker slot → spawn probe → CheckResult → result channel
//! ```
//!
//! Every dequeued check yields exactly one result. A probe runs in its own
//! task, so a panic inside a prober is turned into a failed result instead of
//! taking the pipeline down.
//!
//! On cancellation the dispatcher stops dequeuing, waits for in-flight probes,
//! forwards their results and then drops its result sender, which lets the
//! aggregator drain and stop. Checks still sitting in the work channel are
//! dropped; they were never probed.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, trace, warn};

use crate::check::{Check, CheckResult};
use crate::probe::Prober;

use super::messages::{ResultSender, WorkReceiver};

pub struct DispatcherActor {
    work_rx: WorkReceiver,

    result_tx: ResultSender,

    prober: Arc<dyn Prober>,

    /// One permit per worker slot
    workers: Arc<Semaphore>,

    token: CancellationToken,
}

impl DispatcherActor {
    pub fn new(
        work_rx: WorkReceiver,
        result_tx: ResultSender,
        prober: Arc<dyn Prober>,
        workers: usize,
        token: CancellationToken,
    ) -> Self {
        Self {
            work_rx,
            result_tx,
            prober,
            workers: Arc::new(Semaphore::new(workers.max(1))),
            token,
        }
    }

    #[instrument(skip(self), fields(workers = self.workers.available_permits()))]
    pub async fn run(mut self) {
        debug!("starting dispatcher");

        let mut in_flight = JoinSet::new();

        loop {
            // Reserve a slot before dequeuing so a check is only taken off the
            // queue when it can be probed right away.
            let permit = tokio::select! {
                biased;

                _ = self.token.cancelled() => break,

                permit = Arc::clone(&self.workers).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let check = tokio::select! {
                biased;

                _ = self.token.cancelled() => break,

                check = self.work_rx.recv() => match check {
                    Some(check) => check,
                    None => {
                        debug!("work channel closed");
                        break;
                    }
                },
            };

            trace!("dispatching {}", check.name);

            let prober = Arc::clone(&self.prober);
            let result_tx = self.result_tx.clone();
            in_flight.spawn(async move {
                let result = execute(prober, check).await;
                if result_tx.send(result).await.is_err() {
                    warn!("result channel closed, dropping result");
                }
                drop(permit);
            });

            // Reap finished workers so the set does not grow without bound
            while in_flight.try_join_next().is_some() {}
        }

        if !in_flight.is_empty() {
            debug!("waiting for {} in-flight probes", in_flight.len());
        }
        while in_flight.join_next().await.is_some() {}

        debug!("dispatcher stopped");
    }
}

/// Run one probe in its own task and turn any failure into a result
async fn execute(prober: Arc<dyn Prober>, check: Arc<Check>) -> CheckResult {
    let start = Instant::now();
    let probe_check = Arc::clone(&check);
    let probe = tokio::spawn(async move { prober.probe(&probe_check).await });

    match probe.await {
        Ok(outcome) => CheckResult {
            check,
            success: outcome.success,
            status: outcome.status,
            elapsed: outcome.elapsed,
        },
        Err(e) => {
            error!("probe for {} did not complete: {e}", check.name);
            CheckResult::failed(check, start.elapsed())
        }
    }
}

/// Handle for a spawned DispatcherActor
pub struct DispatcherHandle {
    task: JoinHandle<()>,
}

impl DispatcherHandle {
    pub fn spawn(
        work_rx: WorkReceiver,
        result_tx: ResultSender,
        prober: Arc<dyn Prober>,
        workers: usize,
        token: CancellationToken,
    ) -> Self {
        let actor = DispatcherActor::new(work_rx, result_tx, prober, workers, token);

        Self {
            task: tokio::spawn(actor.run()),
        }
    }

    /// Wait for the actor to stop
    pub async fn join(self) -> anyhow::Result<()> {
        Ok(self.task.await?)
    }
}
