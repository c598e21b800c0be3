//! Request-side types: HTTP method and per-call options.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::{Error, ErrorContext, Result};

/// HTTP method supported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }

    /// Only idempotent reads may be served from or written to the cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            other => Err(Error::configuration_with_context(
                format!("unsupported HTTP method: {}", other),
                ErrorContext::new().with_field_path("method"),
            )),
        }
    }
}

/// Per-call request options.
///
/// Every field is optional; unset fields fall back to the client's
/// [`ClientConfig`]. Explicit `Some(false)` / `Some(0)` always win over the
/// client default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    pub method: Option<Method>,
    /// Overlaid on the client's default headers (names compared case-insensitively).
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
    /// Additional attempts after the first.
    pub retries: Option<u32>,
    pub cache: Option<bool>,
    pub cache_ttl: Option<Duration>,
    /// Share one execution with identical concurrent calls.
    ///
    /// `Some(false)` opts this call out of deduplication: it always reaches the
    /// transport, even while an identical call is in flight, so the
    /// one-call-per-key guarantee no longer covers it.
    pub dedupe: Option<bool>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize any value as the JSON request body.
    pub fn with_json<T: Serialize + ?Sized>(self, body: &T) -> Result<Self> {
        Ok(self.with_body(serde_json::to_value(body)?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = Some(enabled);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_dedupe(mut self, enabled: bool) -> Self {
        self.dedupe = Some(enabled);
        self
    }

    /// Merge over client defaults.
    pub(crate) fn resolve(self, defaults: &ClientConfig) -> ResolvedRequest {
        let mut headers = defaults.default_headers.clone();
        merge_headers(&mut headers, self.headers);
        ResolvedRequest {
            method: self.method.unwrap_or_default(),
            headers,
            body: self.body,
            timeout: self.timeout.unwrap_or(defaults.timeout),
            retries: self.retries.unwrap_or(defaults.retries),
            cache: self.cache.unwrap_or(defaults.cache),
            cache_ttl: self.cache_ttl.unwrap_or(defaults.cache_ttl),
            dedupe: self.dedupe.unwrap_or(defaults.dedupe),
        }
    }
}

/// Request options with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ResolvedRequest {
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
    pub retries: u32,
    pub cache: bool,
    pub cache_ttl: Duration,
    pub dedupe: bool,
}

impl ResolvedRequest {
    /// Whether this call may read and write the response cache.
    pub fn is_cacheable(&self) -> bool {
        self.cache && self.method.is_cacheable()
    }
}

/// Overlay `overlay` onto `base`, replacing entries whose names match ignoring case.
pub(crate) fn merge_headers(base: &mut HashMap<String, String>, overlay: HashMap<String, String>) {
    for (name, value) in overlay {
        base.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        base.insert(name, value);
    }
}
