use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::config::CheckConfig;
use crate::domain::extract_domain;
use crate::error::{ConfigError, ConfigResult};

/// A resolved, immutable probe definition.
///
/// Built once from a [`CheckConfig`] and shared as `Arc<Check>` between the
/// scheduler, the probe workers and the aggregator. Never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub name: String,
    /// Grouping key, derived once from the URL host
    pub domain: String,
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<String>,
    /// Address the URL host is pinned to, bypassing DNS
    pub ip: Option<IpAddr>,
}

impl Check {
    pub fn resolve(config: &CheckConfig) -> ConfigResult<Self> {
        let name = config.name.clone();

        let url = Url::parse(&config.url).map_err(|source| ConfigError::InvalidUrl {
            check: name.clone(),
            url: config.url.clone(),
            source,
        })?;

        let domain = extract_domain(&name, &url)?;

        let method = match &config.method {
            Some(method) => Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
                .map_err(|_| ConfigError::InvalidMethod {
                    check: name.clone(),
                    method: method.clone(),
                })?,
            None => Method::GET,
        };

        let mut headers = HeaderMap::with_capacity(config.headers.len());
        for (key, value) in &config.headers {
            let invalid = || ConfigError::InvalidHeader {
                check: name.clone(),
                name: key.clone(),
            };
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| invalid())?;
            let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
            headers.insert(header_name, header_value);
        }

        let ip = config
            .ip
            .as_deref()
            .map(|ip| {
                ip.parse::<IpAddr>().map_err(|_| ConfigError::InvalidIp {
                    check: name.clone(),
                    ip: ip.to_string(),
                })
            })
            .transpose()?;

        Ok(Check {
            name,
            domain,
            url,
            method,
            headers,
            body: config.body.clone(),
            ip,
        })
    }

    /// Whether a request with this check's method should carry the body
    pub fn sends_body(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }
}

/// Outcome of one probe, consumed exactly once by the aggregator
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub check: Arc<Check>,
    pub success: bool,
    /// HTTP status, if a response arrived before the deadline
    pub status: Option<u16>,
    pub elapsed: Duration,
}

impl CheckResult {
    /// A failed result for a probe that produced no outcome at all
    pub fn failed(check: Arc<Check>, elapsed: Duration) -> Self {
        CheckResult {
            check,
            success: false,
            status: None,
            elapsed,
        }
    }

    pub fn domain(&self) -> &str {
        &self.check.domain
    }
}
