//! Resolver configuration.
//!
//! Configuration is a plain value handed to [`Resolver::new`](crate::Resolver::new).
//! It can be deserialized (durations in whole seconds) or read from the
//! environment with [`ResolverConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const ENV_ALLOWED_DOMAINS: &str = "DID_WEB_ALLOWED_DOMAINS";
const ENV_BLOCKED_DOMAINS: &str = "DID_WEB_BLOCKED_DOMAINS";
const ENV_CACHE_TTL: &str = "DID_WEB_CACHE_TTL_SECS";
const ENV_FETCH_TIMEOUT: &str = "DID_WEB_FETCH_TIMEOUT_SECS";

/// Top-level resolver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Settings for the `did:web` method
    pub web: WebConfig,
}

/// Settings for the `did:web` method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// When non-empty, only these hosts may be resolved
    pub allowed_domains: Vec<String>,

    /// Hosts that are never resolved
    pub blocked_domains: Vec<String>,

    /// How long a fetched document stays cached
    #[serde(rename = "cache_ttl_secs", with = "secs")]
    pub cache_ttl: Duration,

    /// Upper bound on a single document fetch, never zero
    #[serde(rename = "fetch_timeout_secs", with = "nonzero_secs")]
    pub fetch_timeout: Duration,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            allowed_domains: Vec::new(),
            blocked_domains: Vec::new(),
            cache_ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl WebConfig {
    /// Applies the allow and block lists to a host name (no port).
    /// Matching is exact and case-insensitive.
    pub fn is_domain_allowed(&self, host: &str) -> bool {
        let matches = |domain: &String| domain.eq_ignore_ascii_case(host);
        if self.blocked_domains.iter().any(matches) {
            return false;
        }
        self.allowed_domains.is_empty() || self.allowed_domains.iter().any(matches)
    }
}

impl ResolverConfig {
    /// Reads overrides from `DID_WEB_*` environment variables on top of the
    /// defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut web = WebConfig::default();

        if let Some(value) = lookup(ENV_ALLOWED_DOMAINS) {
            web.allowed_domains = domain_list(&value);
        }
        if let Some(value) = lookup(ENV_BLOCKED_DOMAINS) {
            web.blocked_domains = domain_list(&value);
        }
        if let Some(value) = lookup(ENV_CACHE_TTL) {
            web.cache_ttl = seconds(ENV_CACHE_TTL, &value)?;
        }
        if let Some(value) = lookup(ENV_FETCH_TIMEOUT) {
            web.fetch_timeout = seconds(ENV_FETCH_TIMEOUT, &value)?;
            if web.fetch_timeout.is_zero() {
                return Err(ConfigError::InvalidValue {
                    var: ENV_FETCH_TIMEOUT.to_string(),
                    value,
                });
            }
        }

        Ok(Self { web })
    }
}

fn domain_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect()
}

fn seconds(var: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
        })
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

mod nonzero_secs {
    use std::time::Duration;

    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub use super::secs::serialize;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match u64::deserialize(deserializer)? {
            0 => Err(D::Error::custom("duration must be at least one second")),
            secs => Ok(Duration::from_secs(secs)),
        }
    }
}
