use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct RateLimiterSnapshot {
    pub requests: u32,
    pub window_ms: u64,
    /// Admissions recorded inside the trailing window.
    pub in_window: usize,
    /// Estimated wait until the next admission (ms), if currently saturated.
    pub estimated_wait_ms: Option<u64>,
}

/// Sliding-window rate limiter.
///
/// - At most `requests` admissions in any trailing `window`
/// - No fairness queue: a waiter re-checks from scratch after sleeping, so
///   concurrent callers racing a window boundary may be admitted out of order
pub struct RateLimiter {
    cfg: RateLimitConfig,
    window: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(cfg: RateLimitConfig) -> Self {
        let capacity = (cfg.requests as usize).min(1024);
        Self {
            cfg,
            window: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.cfg
    }

    fn trim_locked(cfg: &RateLimitConfig, window: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = window.front() {
            if now.duration_since(oldest) >= cfg.window {
                window.pop_front();
            } else {
                break;
            }
        }
    }

    /// Time until the oldest recorded admission leaves the window, if saturated.
    fn wait_locked(cfg: &RateLimitConfig, window: &VecDeque<Instant>, now: Instant) -> Option<Duration> {
        if window.len() < cfg.requests as usize {
            return None;
        }
        let oldest = *window.front()?;
        Some(cfg.window.saturating_sub(now.duration_since(oldest)))
    }

    /// Suspend until an admission is allowed, then record it.
    pub async fn acquire(&self) {
        let cfg = &self.cfg;

        loop {
            let wait_duration = {
                let mut window = self.window.lock().await;
                let now = Instant::now();
                Self::trim_locked(cfg, &mut window, now);

                match Self::wait_locked(cfg, &window, now) {
                    None => {
                        window.push_back(now);
                        return;
                    }
                    Some(wait) => wait,
                }
            };

            debug!(wait_ms = wait_duration.as_millis() as u64, "rate limit reached, delaying request");
            if !wait_duration.is_zero() {
                tokio::time::sleep(wait_duration).await;
            }
        }
    }

    /// Record an admission only if one is available right now.
    pub async fn try_acquire(&self) -> bool {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        Self::trim_locked(&self.cfg, &mut window, now);

        if Self::wait_locked(&self.cfg, &window, now).is_none() {
            window.push_back(now);
            true
        } else {
            false
        }
    }

    pub async fn snapshot(&self) -> RateLimiterSnapshot {
        let mut window = self.window.lock().await;
        let now = Instant::now();
        Self::trim_locked(&self.cfg, &mut window, now);

        RateLimiterSnapshot {
            requests: self.cfg.requests,
            window_ms: self.cfg.window.as_millis() as u64,
            in_window: window.len(),
            estimated_wait_ms: Self::wait_locked(&self.cfg, &window, now)
                .map(|d| d.as_millis() as u64),
        }
    }
}
