//! Fingerprinted response cache.
//!
//! Completed generations are memoized by a content hash over the canonical
//! request form. Bounded two ways: LRU eviction past `max_size`, and TTL
//! expiry — an expired entry never resurrects, it is dropped on the read
//! that discovers it. Requests carrying a custom prompt bypass the cache
//! entirely (callers enforce this; the fingerprint has no prompt input).

use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use lru::LruCache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::engine::GenerationResponse;
use crate::stack::TechStack;

/// Which pipeline produced a response. Part of the fingerprint: the
/// single-stage and chained paths never share entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// One composite call (`/generate`).
    Single,
    /// The 11-stage pipeline (`/generate/chained`).
    Chained,
}

impl PipelineMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Chained => "chained",
        }
    }
}

/// Compute the deterministic fingerprint for a request.
///
/// Hash input is the canonical form of (image bytes, description, stack,
/// project name, pipeline mode), length-prefixed so adjacent fields cannot
/// collide into each other.
pub fn fingerprint(
    image_bytes: Option<&[u8]>,
    description: &str,
    stack: &TechStack,
    project_name: &str,
    mode: PipelineMode,
) -> String {
    let mut hasher = Sha256::new();

    let image = image_bytes.unwrap_or(&[]);
    hasher.update((image.len() as u64).to_be_bytes());
    hasher.update(image);

    for field in [
        description,
        stack.canonical().as_str(),
        project_name,
        mode.as_str(),
    ] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }

    hex::encode(hasher.finalize())
}

/// Counters and occupancy snapshot, served by `/cache/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub enabled: bool,
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub evictions: u64,
    pub hit_rate: f64,
}

struct Entry {
    response: GenerationResponse,
    created_at: Instant,
}

struct CacheState {
    entries: LruCache<String, Entry>,
    hits: u64,
    misses: u64,
    expirations: u64,
    evictions: u64,
}

/// The process-wide response cache.
pub struct ResponseCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    capacity: usize,
    enabled: bool,
}

impl ResponseCache {
    /// Create a cache with the given bounds. `max_size` of zero disables it
    /// regardless of `enabled`.
    pub fn new(enabled: bool, max_size: usize, ttl: Duration) -> Self {
        let capacity = max_size.max(1);
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::new(
                    NonZeroUsize::new(capacity).expect("capacity is at least 1"),
                ),
                hits: 0,
                misses: 0,
                expirations: 0,
                evictions: 0,
            }),
            ttl,
            capacity,
            enabled: enabled && max_size > 0,
        }
    }

    /// Look up a fingerprint. Counts a hit or miss; drops expired entries.
    pub async fn get(&self, key: &str) -> Option<GenerationResponse> {
        if !self.enabled {
            return None;
        }
        let mut state = self.state.lock().await;

        let expired = match state.entries.get(key) {
            Some(entry) => entry.created_at.elapsed() > self.ttl,
            None => {
                state.misses += 1;
                return None;
            }
        };

        if expired {
            state.entries.pop(key);
            state.expirations += 1;
            state.misses += 1;
            return None;
        }

        state.hits += 1;
        // get() above already refreshed recency.
        state.entries.get(key).map(|e| e.response.clone())
    }

    /// Insert a completed response if the key is still absent.
    ///
    /// Write-on-miss ordering: compute happens outside the lock, insertion
    /// re-checks presence so a concurrent winner's entry is kept.
    pub async fn insert(&self, key: String, response: GenerationResponse) {
        if !self.enabled {
            return;
        }
        let mut state = self.state.lock().await;
        if state.entries.contains(&key) {
            return;
        }
        if let Some((evicted_key, _)) = state.entries.push(
            key,
            Entry {
                response,
                created_at: Instant::now(),
            },
        ) {
            tracing::debug!(key = %evicted_key, "cache eviction (LRU)");
            state.evictions += 1;
        }
    }

    /// Remove one entry. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> bool {
        let mut state = self.state.lock().await;
        state.entries.pop(key).is_some()
    }

    /// Drop every entry. Counters survive (they are process-lifetime).
    pub async fn clear(&self) -> usize {
        let mut state = self.state.lock().await;
        let dropped = state.entries.len();
        state.entries.clear();
        dropped
    }

    /// Current counters and occupancy.
    pub async fn stats(&self) -> CacheStats {
        let state = self.state.lock().await;
        let lookups = state.hits + state.misses;
        CacheStats {
            enabled: self.enabled,
            size: state.entries.len(),
            capacity: self.capacity,
            hits: state.hits,
            misses: state.misses,
            expirations: state.expirations,
            evictions: state.evictions,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                state.hits as f64 / lookups as f64
            },
        }
    }
}
