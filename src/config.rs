//! Client-level configuration.
//!
//! [`ClientConfig`] holds the defaults every call is resolved against. It can be
//! built in code, loaded from YAML, or overlaid from `SPEEDCAST_*` environment
//! variables (see [`crate::ApiClientBuilder::from_env`]).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::{Error, ErrorContext, Result};

/// Sliding-window rate limit: at most `requests` admissions in any trailing `window`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub requests: u32,
    #[serde(rename = "window_ms", with = "duration_ms")]
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(requests: u32, window: Duration) -> Self {
        Self { requests, window }
    }

    pub fn validate(&self) -> Result<()> {
        if self.requests == 0 {
            return Err(Error::configuration_with_context(
                "rate limit quota must be positive",
                ErrorContext::new()
                    .with_field_path("rate_limit.requests")
                    .with_source("config"),
            ));
        }
        if self.window.is_zero() {
            return Err(Error::configuration_with_context(
                "rate limit window must be positive",
                ErrorContext::new()
                    .with_field_path("rate_limit.window_ms")
                    .with_source("config"),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Joined to relative request URLs.
    pub base_url: Option<String>,
    pub default_headers: HashMap<String, String>,
    #[serde(rename = "timeout_ms", with = "duration_ms")]
    pub timeout: Duration,
    pub retries: u32,
    pub cache: bool,
    #[serde(rename = "cache_ttl_ms", with = "duration_ms")]
    pub cache_ttl: Duration,
    pub dedupe: bool,
    pub rate_limit: Option<RateLimitConfig>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            default_headers: HashMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            timeout: Duration::from_millis(10_000),
            retries: 3,
            cache: false,
            cache_ttl: Duration::from_millis(300_000),
            dedupe: true,
            rate_limit: None,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(rl) = &self.rate_limit {
            rl.validate()?;
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "invalid client configuration",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("failed to read {}", path.display()),
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_loader"),
            )
        })?;
        Self::from_yaml_str(&raw)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
