//! Token-bucket rate limiter filter.
//!
//! The bucket is refilled continuously: on each request the elapsed
//! wall-clock time is converted to tokens and added, then one token is
//! consumed. With no token left the request is rejected with
//! `429 Too Many Requests` and the `rateLimited` result label, which flows
//! typically route straight to `END`.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use flowgate_core::registry::{self, FilterKind};
use flowgate_core::{Context, Filter, FilterSpec, Result};

pub const KIND: &str = "RateLimiter";

/// Result label emitted when a request is rejected.
pub const RESULT_RATE_LIMITED: &str = "rateLimited";

const RESULTS: &[&str] = &[RESULT_RATE_LIMITED];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterConfig {
    /// Maximum sustained request rate.
    pub requests_per_second: f64,

    /// Maximum burst size (bucket capacity). Zero means twice the rate.
    #[serde(default)]
    pub burst: u32,
}

impl RateLimiterConfig {
    fn burst_capacity(&self) -> f64 {
        if self.burst > 0 {
            self.burst as f64
        } else {
            (self.requests_per_second * 2.0).ceil()
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Attempts to consume one token, refilling from elapsed time first.
    fn try_consume(&mut self, rate: f64, capacity: f64, now: Instant) -> bool {
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time until the next token becomes available.
    fn time_until_next_token(&self, rate: f64) -> Duration {
        if self.tokens >= 1.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64((1.0 - self.tokens) / rate)
        }
    }
}

/// Rejects requests above a configured sustained rate.
pub struct RateLimiter {
    config: RateLimiterConfig,
    bucket: Arc<Mutex<TokenBucket>>,
    passed: Arc<AtomicU64>,
    limited: Arc<AtomicU64>,
}

impl RateLimiter {
    fn new() -> Self {
        Self {
            config: RateLimiterConfig {
                requests_per_second: f64::MAX,
                burst: 0,
            },
            bucket: Arc::new(Mutex::new(TokenBucket::new(0.0))),
            passed: Arc::new(AtomicU64::new(0)),
            limited: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Filter for RateLimiter {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn init(&mut self, spec: &FilterSpec) -> Result<()> {
        self.config = spec.config()?;
        self.bucket = Arc::new(Mutex::new(TokenBucket::new(self.config.burst_capacity())));
        Ok(())
    }

    fn inherit(&mut self, spec: &FilterSpec, prev: &dyn Filter) -> Result<()> {
        self.config = spec.config()?;
        match prev.as_any().downcast_ref::<RateLimiter>() {
            // Keep the live bucket and counters so the limit is not reset
            // by a reload.
            Some(prev) => {
                self.bucket = Arc::clone(&prev.bucket);
                self.passed = Arc::clone(&prev.passed);
                self.limited = Arc::clone(&prev.limited);
            }
            None => {
                self.bucket = Arc::new(Mutex::new(TokenBucket::new(self.config.burst_capacity())));
            }
        }
        Ok(())
    }

    fn handle(&self, ctx: &mut Context) -> String {
        let rate = self.config.requests_per_second;
        let now = Instant::now();
        let (allowed, retry_after) = {
            let mut bucket = self.bucket.lock().unwrap();
            let allowed = bucket.try_consume(rate, self.config.burst_capacity(), now);
            (allowed, bucket.time_until_next_token(rate))
        };

        if allowed {
            self.passed.fetch_add(1, Ordering::Relaxed);
            return String::new();
        }

        self.limited.fetch_add(1, Ordering::Relaxed);
        debug!(path = %ctx.request().path, "rate limit exceeded");

        let resp = ctx.response_mut();
        resp.status_code = 429;
        resp.set_header(
            "Retry-After",
            retry_after.as_secs_f64().ceil().max(1.0).to_string(),
        );
        resp.body = b"rate limit exceeded".to_vec();

        RESULT_RATE_LIMITED.to_string()
    }

    fn status(&self) -> serde_json::Value {
        json!({
            "passed": self.passed.load(Ordering::Relaxed),
            "limited": self.limited.load(Ordering::Relaxed),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub(crate) fn register() {
    registry::register(FilterKind {
        name: KIND,
        results: RESULTS,
        default_spec: || json!({"kind": KIND, "requestsPerSecond": 100.0}),
        create: || Box::new(RateLimiter::new()),
        check_spec: |spec| spec.config::<RateLimiterConfig>().map(|_| ()),
    });
}
