pub mod actors;
pub mod check;
pub mod config;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod report;
pub mod shutdown;
pub mod stats;

pub use check::{Check, CheckResult};
pub use config::{CheckConfig, Config, CounterMode, Settings, read_config_file};
pub use domain::{GroupedChecks, group_into_domains};
pub use error::{ConfigError, ConfigResult};
pub use pipeline::Pipeline;
pub use probe::{HttpProber, ProbeOutcome, ProbeTimings, Prober};
pub use report::{ReportSink, StdoutSink};
pub use stats::{DomainAvailability, DomainStats, DomainStatsMap, Report};
