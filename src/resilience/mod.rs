//! 弹性模块：滑动窗口限流器。
//!
//! # Resilience Primitives Module
//!
//! Opt-in admission control for outgoing requests.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`rate_limiter`] | Sliding-window rate limiter for throughput control |
//!
//! ## Rate Limiter
//!
//! The limiter counts admissions in the trailing window rather than in
//! fixed-aligned buckets. When the window is saturated the caller sleeps until
//! the oldest admission leaves it, then re-checks.
//!
//! ```rust
//! use speedcast::resilience::rate_limiter::RateLimiter;
//! use speedcast::RateLimitConfig;
//! use std::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let limiter = RateLimiter::new(RateLimitConfig::new(2, Duration::from_secs(1)));
//! assert!(limiter.try_acquire().await);
//! assert!(limiter.try_acquire().await);
//! assert!(!limiter.try_acquire().await);
//! # }
//! ```

pub mod rate_limiter;

pub use rate_limiter::{RateLimiter, RateLimiterSnapshot};
