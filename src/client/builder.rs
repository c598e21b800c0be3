use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::core::ApiClient;
use super::execution::RequestExecutor;
use crate::cache::ResponseCache;
use crate::config::{ClientConfig, RateLimitConfig};
use crate::dedup::RequestDeduplicator;
use crate::resilience::rate_limiter::RateLimiter;
use crate::transport::{ReqwestTransport, Transport};
use crate::types::request::merge_headers;
use crate::Result;

/// Builder for creating clients with custom configuration.
pub struct ApiClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self::from_config(ClientConfig::default())
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            transport: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        merge_headers(
            &mut self.config.default_headers,
            HashMap::from([(name.into(), value.into())]),
        );
        self
    }

    /// Replace the default headers entirely.
    pub fn default_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.config.default_headers = headers;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    pub fn cache(mut self, enabled: bool) -> Self {
        self.config.cache = enabled;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    pub fn dedupe(mut self, enabled: bool) -> Self {
        self.config.dedupe = enabled;
        self
    }

    /// Enable sliding-window rate limiting: at most `requests` per `window`.
    pub fn rate_limit(mut self, requests: u32, window: Duration) -> Self {
        self.config.rate_limit = Some(RateLimitConfig::new(requests, window));
        self
    }

    /// Inject a transport. Default is [`ReqwestTransport`].
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Overlay settings from the environment:
    /// - `SPEEDCAST_BASE_URL`
    /// - `SPEEDCAST_TIMEOUT_MS`
    /// - `SPEEDCAST_RETRIES`
    /// - `SPEEDCAST_CACHE` (`1`/`true` or `0`/`false`)
    /// - `SPEEDCAST_CACHE_TTL_MS`
    /// - `SPEEDCAST_RATE_LIMIT_REQUESTS` with `SPEEDCAST_RATE_LIMIT_WINDOW_MS`
    pub fn from_env(mut self) -> Self {
        fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
        }

        if let Ok(base_url) = std::env::var("SPEEDCAST_BASE_URL") {
            if !base_url.trim().is_empty() {
                self.config.base_url = Some(base_url.trim().to_string());
            }
        }
        if let Some(ms) = var::<u64>("SPEEDCAST_TIMEOUT_MS") {
            self.config.timeout = Duration::from_millis(ms);
        }
        if let Some(retries) = var::<u32>("SPEEDCAST_RETRIES") {
            self.config.retries = retries;
        }
        if let Ok(raw) = std::env::var("SPEEDCAST_CACHE") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" => self.config.cache = true,
                "0" | "false" => self.config.cache = false,
                _ => {}
            }
        }
        if let Some(ms) = var::<u64>("SPEEDCAST_CACHE_TTL_MS") {
            self.config.cache_ttl = Duration::from_millis(ms);
        }
        if let (Some(requests), Some(window_ms)) = (
            var::<u32>("SPEEDCAST_RATE_LIMIT_REQUESTS"),
            var::<u64>("SPEEDCAST_RATE_LIMIT_WINDOW_MS"),
        ) {
            self.config.rate_limit = Some(RateLimitConfig::new(
                requests,
                Duration::from_millis(window_ms),
            ));
        }
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the client.
    pub fn build(self) -> Result<ApiClient> {
        self.config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let executor = RequestExecutor::new(transport);
        let rate_limiter = self
            .config
            .rate_limit
            .clone()
            .map(|cfg| Arc::new(RateLimiter::new(cfg)));

        debug!(
            transport = executor.transport_name(),
            base_url = self.config.base_url.as_deref().unwrap_or(""),
            rate_limited = rate_limiter.is_some(),
            "speedcast client built"
        );

        Ok(ApiClient {
            cache: Arc::new(ResponseCache::new(self.config.cache_ttl)),
            defaults: Arc::new(ArcSwap::from_pointee(self.config)),
            executor: Arc::new(executor),
            dedup: RequestDeduplicator::new(),
            rate_limiter,
        })
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
