//! # speedcast
//!
//! 轻量级 HTTP 请求编排器：缓存、去重、限流与重试。
//!
//! A client-side HTTP request orchestrator. Given a URL and request options it
//! decides whether to serve a cached result, whether to coalesce the call with an
//! identical in-flight call, whether to delay it to respect a rate budget, how many
//! times to retry it, and how to shape the final typed response.
//!
//! ## Key Features
//!
//! - **Unified Client**: [`ApiClient`] exposes `get`/`post`/`put`/`delete`/`patch`
//! - **Caching**: TTL-based response caching for GET requests via [`cache`]
//! - **Deduplication**: concurrent identical calls share one execution via [`dedup`]
//! - **Rate Limiting**: sliding-window admission via [`resilience`]
//! - **Retries**: exponential backoff with client-error short-circuiting
//! - **Pluggable Transport**: any [`transport::Transport`]; `reqwest` by default
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use speedcast::{ApiClient, RequestConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> speedcast::Result<()> {
//!     let client = ApiClient::builder()
//!         .base_url("https://api.example.com")
//!         .cache(true)
//!         .cache_ttl(Duration::from_secs(60))
//!         .build()?;
//!
//!     let users = client
//!         .get::<serde_json::Value>("/users", None)
//!         .await?;
//!     println!("{} {}", users.status, users.data);
//!
//!     let created = client
//!         .post::<serde_json::Value, _>(
//!             "/users",
//!             &serde_json::json!({ "name": "Jane" }),
//!             Some(RequestConfig::new().with_retries(0)),
//!         )
//!         .await?;
//!     println!("{}", created.status);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Orchestrating client, builder and request execution |
//! | [`config`] | Client-level defaults and rate limit configuration |
//! | [`cache`] | Response cache and cache key derivation |
//! | [`dedup`] | In-flight request deduplication |
//! | [`resilience`] | Sliding-window rate limiter |
//! | [`transport`] | Transport abstraction and the `reqwest` implementation |
//! | [`types`] | Request options, methods and response types |

pub mod cache;
pub mod client;
pub mod config;
pub mod dedup;
pub mod resilience;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ApiClientBuilder};
pub use config::{ClientConfig, RateLimitConfig};
pub use types::{
    request::{Method, RequestConfig},
    response::{ApiResponse, ContentKind, ResponseBody},
};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
