//! Adaptive rate limiting wrapper around governor.
//!
//! Market-data endpoints throttle aggressive clients. The limiter starts at
//! the configured per-minute budget, shrinks it while the recent error rate is
//! high (HTTP 429, timeouts) and grows it back toward the base once requests
//! succeed again.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::collections::VecDeque;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Adaptive per-minute rate limiter.
pub struct AdaptiveRateLimiter {
    limiter: DefaultDirectRateLimiter,
    base_quota: u32,
    current_quota: u32,
    /// Recent request outcomes, `true` for success
    window: VecDeque<bool>,
    window_size: usize,
    error_threshold: f64,
    min_quota: u32,
    last_adjustment: Instant,
    adjustment_interval: Duration,
}

fn per_minute(requests: u32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_minute(NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN)))
}

impl AdaptiveRateLimiter {
    /// Create a limiter allowing `requests_per_minute` at full health.
    pub fn new(requests_per_minute: u32, window_size: usize, error_threshold: f64) -> Self {
        let base_quota = requests_per_minute.max(1);
        Self {
            limiter: per_minute(base_quota),
            base_quota,
            current_quota: base_quota,
            window: VecDeque::with_capacity(window_size),
            window_size: window_size.max(1),
            error_threshold: error_threshold.clamp(0.0, 1.0),
            min_quota: (base_quota / 4).max(1),
            last_adjustment: Instant::now(),
            adjustment_interval: Duration::from_secs(30),
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        self.limiter.until_ready().await;
    }

    /// Non-blocking permit check.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn record_success(&mut self) {
        self.record(true);
    }

    pub fn record_failure(&mut self) {
        self.record(false);
    }

    fn record(&mut self, success: bool) {
        self.window.push_back(success);
        while self.window.len() > self.window_size {
            self.window.pop_front();
        }
        if self.should_adjust() {
            self.adjust_quota();
        }
    }

    fn should_adjust(&self) -> bool {
        self.window.len() >= self.window_size / 2
            && self.last_adjustment.elapsed() >= self.adjustment_interval
    }

    /// Fraction of failed requests in the window.
    pub fn error_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|&&ok| !ok).count();
        failures as f64 / self.window.len() as f64
    }

    fn adjust_quota(&mut self) {
        let error_rate = self.error_rate();
        let old_quota = self.current_quota;

        if error_rate > self.error_threshold {
            self.current_quota = (self.current_quota / 2).max(self.min_quota);
            warn!(
                "Error rate {:.0}%, reducing request budget from {} to {} per minute",
                error_rate * 100.0,
                old_quota,
                self.current_quota
            );
        } else if error_rate < self.error_threshold / 2.0 {
            self.current_quota = (self.current_quota + self.base_quota / 4)
                .max(self.current_quota + 1)
                .min(self.base_quota);
        }

        if self.current_quota != old_quota {
            self.limiter = per_minute(self.current_quota);
            self.last_adjustment = Instant::now();
            debug!("Request budget now {} per minute", self.current_quota);
        }
    }

    pub fn current_quota(&self) -> u32 {
        self.current_quota
    }

    pub fn base_quota(&self) -> u32 {
        self.base_quota
    }
}
