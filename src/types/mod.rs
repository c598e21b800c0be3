//! 类型模块：请求选项、HTTP 方法与响应类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of what a caller asks for and what it gets back.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Method`] | HTTP method (GET, POST, PUT, DELETE, PATCH) |
//! | [`RequestConfig`] | Per-call options, resolved against client defaults |
//! | [`ApiResponse`] | Status, status text, flattened headers and decoded data |
//! | [`ResponseBody`] | Decoded payload: JSON, text or binary |
//! | [`ContentKind`] | Body kind resolved once from the `Content-Type` header |
//!
//! ## Example
//!
//! ```rust
//! use speedcast::types::{Method, RequestConfig};
//! use std::time::Duration;
//!
//! let config = RequestConfig::new()
//!     .with_method(Method::Get)
//!     .with_header("Accept", "application/json")
//!     .with_timeout(Duration::from_secs(2))
//!     .with_retries(0)
//!     .with_cache(true);
//! assert_eq!(config.retries, Some(0));
//! ```

pub mod request;
pub mod response;

pub use request::{Method, RequestConfig};
pub use response::{ApiResponse, ContentKind, ResponseBody};
