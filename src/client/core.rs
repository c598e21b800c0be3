use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, Instrument};
use url::Url;
use uuid::Uuid;

use super::builder::ApiClientBuilder;
use super::execution::RequestExecutor;
use crate::cache::{CacheKey, CacheStats, ResponseCache};
use crate::config::ClientConfig;
use crate::dedup::RequestDeduplicator;
use crate::resilience::rate_limiter::{RateLimiter, RateLimiterSnapshot};
use crate::types::request::{merge_headers, Method, RequestConfig};
use crate::types::response::{ApiResponse, ResponseBody};
use crate::{Error, ErrorContext, Result};

/// HTTP client that orchestrates rate limiting, caching, deduplication and retries.
///
/// Cheap to clone: clones share the same cache, pending-request map, rate
/// window and defaults.
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) defaults: Arc<ArcSwap<ClientConfig>>,
    pub(crate) executor: Arc<RequestExecutor>,
    pub(crate) cache: Arc<ResponseCache>,
    pub(crate) dedup: RequestDeduplicator<ApiResponse<ResponseBody>>,
    pub(crate) rate_limiter: Option<Arc<RateLimiter>>,
}

impl ApiClient {
    /// Create a client with the default `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ApiClientBuilder::from_config(config).build()
    }

    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// Execute a request and return the decoded, untyped response.
    ///
    /// Sequence: rate limiter -> cache lookup (GET with caching) -> in-flight
    /// deduplication -> execution with retries -> cache write.
    pub async fn send(&self, url: &str, config: RequestConfig) -> Result<ApiResponse<ResponseBody>> {
        let defaults = self.defaults.load_full();
        let full_url = resolve_url(defaults.base_url.as_deref(), url)?;
        let request = config.resolve(&defaults);

        if let Some(limiter) = &self.rate_limiter {
            limiter.acquire().await;
        }

        let key = CacheKey::derive(Some(request.method), &full_url, request.body.as_ref());
        let cacheable = request.is_cacheable();
        if request.cache && !cacheable {
            debug!(
                method = request.method.as_str(),
                url = full_url.as_str(),
                "caching skipped for non-GET request"
            );
        }
        if cacheable {
            if let Some(hit) = self.cache.get(&key) {
                debug!(key = %key, "cache hit");
                return Ok(hit);
            }
        }

        let dedupe = request.dedupe;
        let executor = Arc::clone(&self.executor);
        let cache = Arc::clone(&self.cache);
        let cache_key = key.clone();
        let span = tracing::info_span!(
            "speedcast_request",
            request_id = %Uuid::new_v4(),
            method = request.method.as_str(),
            url = full_url.as_str(),
        );
        let operation = move || {
            async move {
                let response = executor.execute(&full_url, &request).await?;
                if cacheable {
                    cache.set(cache_key, response.clone(), Some(request.cache_ttl));
                }
                Ok(response)
            }
            .instrument(span)
        };

        if dedupe {
            self.dedup.run(key, operation).await
        } else {
            operation().await
        }
    }

    /// Execute a request and convert the body into `T`.
    pub async fn request<T: DeserializeOwned>(&self, url: &str, config: RequestConfig) -> Result<ApiResponse<T>> {
        self.send(url, config).await?.into_typed()
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str, config: Option<RequestConfig>) -> Result<ApiResponse<T>> {
        self.request(url, config.unwrap_or_default().with_method(Method::Get))
            .await
    }

    pub async fn post<T, B>(&self, url: &str, body: &B, config: Option<RequestConfig>) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with_body(Method::Post, url, body, config).await
    }

    pub async fn put<T, B>(&self, url: &str, body: &B, config: Option<RequestConfig>) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with_body(Method::Put, url, body, config).await
    }

    pub async fn patch<T, B>(&self, url: &str, body: &B, config: Option<RequestConfig>) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_with_body(Method::Patch, url, body, config).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str, config: Option<RequestConfig>) -> Result<ApiResponse<T>> {
        self.request(url, config.unwrap_or_default().with_method(Method::Delete))
            .await
    }

    async fn request_with_body<T, B>(
        &self,
        method: Method,
        url: &str,
        body: &B,
        config: Option<RequestConfig>,
    ) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let config = config
            .unwrap_or_default()
            .with_method(method)
            .with_json(body)?;
        self.request(url, config).await
    }

    /// Drop every cached response.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Change the base URL for subsequent calls; in-flight calls are unaffected.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        self.defaults.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            next.base_url = Some(base_url.clone());
            next
        });
    }

    /// Merge `headers` into the default headers for subsequent calls.
    pub fn set_default_headers(&self, headers: HashMap<String, String>) {
        self.defaults.rcu(|current| {
            let mut next = ClientConfig::clone(current);
            merge_headers(&mut next.default_headers, headers.clone());
            next
        });
    }

    pub fn base_url(&self) -> Option<String> {
        self.defaults.load().base_url.clone()
    }

    pub fn default_headers(&self) -> HashMap<String, String> {
        self.defaults.load().default_headers.clone()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Number of distinct requests currently executing.
    pub fn in_flight(&self) -> usize {
        self.dedup.in_flight()
    }

    pub async fn rate_limiter_snapshot(&self) -> Option<RateLimiterSnapshot> {
        match &self.rate_limiter {
            Some(rl) => Some(rl.snapshot().await),
            None => None,
        }
    }
}

/// Absolute URLs pass through; relative ones are joined to `base_url` with exactly one `/`.
pub(crate) fn resolve_url(base_url: Option<&str>, url: &str) -> Result<String> {
    if matches!(Url::parse(url), Ok(parsed) if parsed.has_host()) {
        return Ok(url.to_string());
    }
    match base_url {
        Some(base) if !base.is_empty() => Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            url.trim_start_matches('/')
        )),
        _ => Err(Error::configuration_with_context(
            format!("relative URL {:?} requires a base URL", url),
            ErrorContext::new()
                .with_field_path("base_url")
                .with_source("url_resolver"),
        )),
    }
}
