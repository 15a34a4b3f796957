//! Token-bucket rate limiting per (client identity, endpoint class).
//!
//! Each endpoint class carries a capacity and refill rate; each incoming
//! request consumes one token. A refusal carries an advisory wait derived
//! from the bucket's next-refill time. Full buckets that have sat idle past
//! a threshold are garbage-collected on access so the map stays bounded by
//! the set of recently active clients.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

/// Idle-full buckets older than this are dropped during the access sweep.
const STALE_AFTER: Duration = Duration::from_secs(600);

/// A rate class: the budget an endpoint group grants each client.
#[derive(Debug, Clone, Copy)]
pub struct RateClass {
    /// Stable class name, part of the bucket key.
    pub name: &'static str,
    /// Burst capacity in tokens.
    pub capacity: u32,
    /// Refill rate in tokens per second.
    pub refill_per_sec: f64,
}

impl RateClass {
    /// A class expressed as requests per minute (capacity = the same count).
    pub fn per_minute(name: &'static str, per_minute: u32) -> Self {
        Self {
            name,
            capacity: per_minute,
            refill_per_sec: f64::from(per_minute) / 60.0,
        }
    }
}

/// Refusal detail: how long until a token will be available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAfter {
    /// Advisory wait in whole seconds (at least 1).
    pub seconds: u64,
}

struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// The process-wide rate limiter.
pub struct RateLimiter {
    buckets: Mutex<HashMap<(String, &'static str), Bucket>>,
    enabled: bool,
}

impl RateLimiter {
    /// Create a limiter; a disabled limiter admits everything.
    pub fn new(enabled: bool) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            enabled,
        }
    }

    /// Attempt to consume one token for `client` in `class`.
    pub async fn try_acquire(&self, client: &str, class: RateClass) -> Result<(), RetryAfter> {
        if !self.enabled {
            return Ok(());
        }

        let now = Instant::now();
        let mut buckets = self.buckets.lock().await;

        // Timer hygiene: drop buckets that are full and idle.
        buckets.retain(|_, b| {
            !(b.tokens >= f64::from(class.capacity)
                && now.duration_since(b.last_refill) > STALE_AFTER)
        });

        let bucket = buckets
            .entry((client.to_string(), class.name))
            .or_insert_with(|| Bucket {
                tokens: f64::from(class.capacity),
                last_refill: now,
            });

        // Refill for the elapsed interval, capped at capacity.
        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens =
            (bucket.tokens + elapsed * class.refill_per_sec).min(f64::from(class.capacity));
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(())
        } else {
            let deficit = 1.0 - bucket.tokens;
            let wait = (deficit / class.refill_per_sec).ceil().max(1.0);
            tracing::debug!(
                client,
                class = class.name,
                wait_secs = wait,
                "rate limit refusal",
            );
            Err(RetryAfter {
                seconds: wait as u64,
            })
        }
    }

    /// Number of live buckets (operational visibility).
    pub async fn bucket_count(&self) -> usize {
        self.buckets.lock().await.len()
    }
}
