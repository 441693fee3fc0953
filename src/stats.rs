//! Per-domain availability counters and reports

use std::collections::BTreeMap;
use std::fmt;

use tracing::warn;

/// Probe counters for one domain.
///
/// The only mutator is [`DomainStats::record`], which keeps `up <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomainStats {
    up: u64,
    total: u64,
}

impl DomainStats {
    pub fn up(&self) -> u64 {
        self.up
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn record(&mut self, success: bool) {
        self.total += 1;
        if success {
            self.up += 1;
        }
    }

    /// Percentage of successful probes, `None` until something was recorded
    pub fn availability(&self) -> Option<f64> {
        (self.total > 0).then(|| 100.0 * self.up as f64 / self.total as f64)
    }

    pub fn reset(&mut self) {
        *self = DomainStats::default();
    }
}

/// Stats for every known domain, ordered by domain name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainStatsMap {
    domains: BTreeMap<String, DomainStats>,
}

impl DomainStatsMap {
    /// Insert a zeroed entry for `domain` unless one already exists
    pub fn seed(&mut self, domain: &str) {
        if !self.domains.contains_key(domain) {
            self.domains.insert(domain.to_string(), DomainStats::default());
        }
    }

    pub fn record(&mut self, domain: &str, success: bool) {
        match self.domains.get_mut(domain) {
            Some(stats) => stats.record(success),
            None => {
                warn!("result for ungrouped domain {domain}, adding it");
                self.domains
                    .entry(domain.to_string())
                    .or_default()
                    .record(success);
            }
        }
    }

    pub fn get(&self, domain: &str) -> Option<&DomainStats> {
        self.domains.get(domain)
    }

    pub fn domains(&self) -> Vec<&str> {
        self.domains.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DomainStats)> {
        self.domains.iter().map(|(domain, stats)| (domain.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn reset(&mut self) {
        self.domains.values_mut().for_each(DomainStats::reset);
    }

    /// Build a report line for every known domain
    pub fn report(&self, round: u64) -> Report {
        Report {
            round,
            lines: self
                .iter()
                .map(|(domain, stats)| DomainAvailability::new(domain, stats))
                .collect(),
        }
    }
}

/// Availability of one domain at report time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAvailability {
    pub domain: String,
    pub up: u64,
    pub total: u64,
    /// Rounded percentage; 0 when nothing has been recorded yet
    pub percent: u64,
}

impl DomainAvailability {
    fn new(domain: &str, stats: &DomainStats) -> Self {
        DomainAvailability {
            domain: domain.to_string(),
            up: stats.up(),
            total: stats.total(),
            percent: stats.availability().map_or(0, |p| p.round() as u64),
        }
    }
}

impl fmt::Display for DomainAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has {}% availability percentage",
            self.domain, self.percent
        )
    }
}

/// Availability of every domain after one round
#[derive(Debug, Clone)]
pub struct Report {
    /// 1-based round counter
    pub round: u64,
    pub lines: Vec<DomainAvailability>,
}

impl Report {
    pub fn line(&self, domain: &str) -> Option<&DomainAvailability> {
        self.lines.iter().find(|line| line.domain == domain)
    }
}
