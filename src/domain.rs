//! Domain grouping
//!
//! Every check is grouped under a coarse domain key: the last two DNS labels
//! of its URL hostname (`api.example.com` → `example.com`).
//!
//! This is deliberately naive. Multi-part public suffixes are not recognised,
//! so `sub.pages.example.co.uk` groups under `co.uk`. Hosts that cannot yield
//! two labels (`localhost`, IP literals) are rejected as configuration errors.

use std::sync::Arc;

use url::{Host, Url};

use crate::check::Check;
use crate::config::CheckConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::stats::DomainStatsMap;

/// Checks annotated with their domain, plus one zeroed stats entry per domain
#[derive(Debug, Clone)]
pub struct GroupedChecks {
    pub checks: Vec<Arc<Check>>,
    pub stats: DomainStatsMap,
}

/// Derive the domain key for `url`. `check` is only used for error reporting.
pub fn extract_domain(check: &str, url: &Url) -> ConfigResult<String> {
    let host = match url.host() {
        Some(Host::Domain(host)) => host,
        Some(Host::Ipv4(ip)) => {
            return Err(ConfigError::IpHost {
                check: check.to_string(),
                host: ip.to_string(),
            });
        }
        Some(Host::Ipv6(ip)) => {
            return Err(ConfigError::IpHost {
                check: check.to_string(),
                host: ip.to_string(),
            });
        }
        None => {
            return Err(ConfigError::MissingHost {
                check: check.to_string(),
                url: url.to_string(),
            });
        }
    };

    let labels: Vec<&str> = host.trim_end_matches('.').split('.').collect();
    match labels.as_slice() {
        [.., second_level, top_level] if !second_level.is_empty() && !top_level.is_empty() => {
            Ok(format!("{second_level}.{top_level}"))
        }
        _ => Err(ConfigError::ShortHostname {
            check: check.to_string(),
            host: host.to_string(),
        }),
    }
}

/// Resolve the configured checks (deriving each domain once) and seed a
/// zeroed stats entry for every distinct domain.
///
/// Check order is preserved. Any invalid check aborts grouping.
pub fn group_into_domains(configs: &[CheckConfig]) -> ConfigResult<GroupedChecks> {
    let mut checks = Vec::with_capacity(configs.len());
    let mut stats = DomainStatsMap::default();

    for config in configs {
        let check = Check::resolve(config)?;
        stats.seed(&check.domain);
        checks.push(Arc::new(check));
    }

    Ok(GroupedChecks { checks, stats })
}
