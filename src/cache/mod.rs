//! 响应缓存模块：基于 TTL 的内存缓存，仅用于幂等的 GET 请求。
//!
//! # Response Caching Module
//!
//! In-process response caching with per-entry expiry, reducing repeated calls
//! for identical idempotent reads.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ResponseCache`] | Key-value store with absolute expiry and lazy eviction |
//! | [`CacheKey`] | Deterministic key derived from method, URL and body |
//! | [`CacheStats`] | Hit / miss / set counters |
//!
//! ## Example
//!
//! ```rust
//! use speedcast::cache::{CacheKey, ResponseCache};
//! use speedcast::Method;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cache: ResponseCache<String> = ResponseCache::new(Duration::from_secs(60));
//! let key = CacheKey::derive(Some(Method::Get), "https://api.test.com/users", None);
//! cache.set(key.clone(), "cached".to_string(), None);
//! assert_eq!(cache.get(&key).as_deref(), Some("cached"));
//! # }
//! ```
//!
//! ## Expiry
//!
//! Entries are never swept in the background. An entry whose expiry has passed
//! is removed by the read that observes it, or by [`ResponseCache::clear`].

mod key;
mod store;

pub use key::CacheKey;
pub use store::{CacheStats, ResponseCache};
