//! Cache key generation.

use crate::types::request::Method;

/// Identifies a request for caching and in-flight deduplication.
///
/// Derived as `METHOD:url:body`, where the body is its compact JSON
/// serialization (`{}` when absent). Object keys serialize in sorted order, so
/// structurally equal bodies produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn derive(method: Option<Method>, url: &str, body: Option<&serde_json::Value>) -> Self {
        let method = method.unwrap_or_default();
        let body = body
            .map(|b| b.to_string())
            .unwrap_or_else(|| "{}".to_string());
        Self(format!("{}:{}:{}", method.as_str(), url, body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
