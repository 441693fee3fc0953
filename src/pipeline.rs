//! Wiring of the three pipeline actors

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::actors::aggregator::AggregatorHandle;
use crate::actors::dispatcher::DispatcherHandle;
use crate::actors::messages::AggregatorSnapshot;
use crate::actors::scheduler::SchedulerHandle;
use crate::config::Settings;
use crate::domain::GroupedChecks;
use crate::probe::Prober;
use crate::report::ReportSink;
use crate::stats::DomainStatsMap;

/// A running scheduler → dispatcher → aggregator pipeline
pub struct Pipeline {
    scheduler: SchedulerHandle,
    dispatcher: DispatcherHandle,
    aggregator: AggregatorHandle,
    token: CancellationToken,
}

impl Pipeline {
    /// Spawn all three actors. Probing starts immediately.
    ///
    /// Cancelling `token` (or calling [`Pipeline::shutdown`]) stops the
    /// pipeline; [`Pipeline::join`] then yields the final counters.
    pub fn spawn(
        grouped: GroupedChecks,
        settings: &Settings,
        prober: Arc<dyn Prober>,
        sink: Arc<dyn ReportSink>,
        token: CancellationToken,
    ) -> Self {
        let GroupedChecks { checks, stats } = grouped;
        let round_size = checks.len();

        debug!(
            "spawning pipeline: {round_size} checks in {} domains",
            stats.len()
        );

        let (work_tx, work_rx) = mpsc::channel(settings.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(settings.queue_capacity);

        let aggregator =
            AggregatorHandle::spawn(stats, round_size, settings.counters, result_rx, sink);
        let dispatcher = DispatcherHandle::spawn(
            work_rx,
            result_tx,
            prober,
            settings.workers,
            token.clone(),
        );
        let scheduler =
            SchedulerHandle::spawn(checks.into(), work_tx, settings.interval(), token.clone());

        Self {
            scheduler,
            dispatcher,
            aggregator,
            token,
        }
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }

    pub async fn snapshot(&self) -> Result<AggregatorSnapshot> {
        self.aggregator.snapshot().await
    }

    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Wait for every actor to stop and return the final counters.
    ///
    /// Only returns once the pipeline was cancelled.
    pub async fn join(self) -> Result<DomainStatsMap> {
        self.scheduler.join().await?;
        self.dispatcher.join().await?;
        self.aggregator.join().await
    }
}
