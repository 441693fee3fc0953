//! Actor-based probing pipeline
//!
//! Each actor runs as an independent tokio task. They share no state and talk
//! only through typed channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!   ┌─────────────┐   Arc<Check>   ┌──────────────┐  CheckResult  ┌──────────────┐
//!   │  Scheduler  │ ─────────────► │  Dispatcher  │ ────────────► │  Aggregator  │ ──► ReportSink
//!   │ (interval)  │  work channel  │ (worker pool)│ result channel│ (owns stats) │
//!   └─────────────┘                └──────┬───────┘               └──────────────┘
//!                                         │ per check
//!                                         ▼
//!                                      Prober
//! ```
//!
//! ## Actor Types
//!
//! - **SchedulerActor**: enqueues every check on each tick
//! - **DispatcherActor**: runs probes through a bounded worker pool
//! - **AggregatorActor**: owns the per-domain counters and emits reports
//!
//! ## Shutdown
//!
//! A `CancellationToken` stops the scheduler and the dispatcher. The
//! aggregator stops once the dispatcher has dropped the result sender, so
//! every result produced before shutdown is counted.

pub mod aggregator;
pub mod dispatcher;
pub mod messages;
pub mod scheduler;
