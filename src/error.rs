//! Error types for configuration loading and check resolution

use std::path::PathBuf;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fatal errors raised while loading the configuration or resolving checks.
///
/// None of these are recoverable: the pipeline must not start when one occurs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read configuration file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The JSON configuration is malformed
    #[error("invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// The YAML configuration is malformed
    #[error("invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The TOML configuration is malformed
    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// No checks were configured
    #[error("configuration contains no checks")]
    NoChecks,

    /// A setting has a value the pipeline cannot run with
    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    /// A check URL does not parse as an absolute URL
    #[error("check `{check}`: invalid url `{url}`: {source}")]
    InvalidUrl {
        check: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// A check URL has no host component
    #[error("check `{check}`: url `{url}` has no host")]
    MissingHost { check: String, url: String },

    /// A check URL targets an IP literal, which has no domain to group by
    #[error("check `{check}`: host `{host}` is an IP address, a DNS name is required")]
    IpHost { check: String, host: String },

    /// A check hostname has fewer than two labels
    #[error("check `{check}`: host `{host}` needs at least two labels to derive a domain")]
    ShortHostname { check: String, host: String },

    /// A check method is not a valid HTTP method token
    #[error("check `{check}`: invalid HTTP method `{method}`")]
    InvalidMethod { check: String, method: String },

    /// A check header name or value is not valid HTTP
    #[error("check `{check}`: invalid header `{name}`")]
    InvalidHeader { check: String, name: String },

    /// A check `ip` override does not parse
    #[error("check `{check}`: invalid ip override `{ip}`")]
    InvalidIp { check: String, ip: String },
}
