//! Process-wide metrics.
//!
//! Monotone counters keyed by stable names, an estimated-cost accumulator,
//! and bounded per-endpoint latency reservoirs (rolling mean over all
//! observations, p95 over the most recent window). Everything here lives
//! for the process lifetime and resets on restart.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::ErrorCode;
use crate::llm::TokenUsage;

/// Most recent samples kept per endpoint for percentile estimation.
const RESERVOIR_SIZE: usize = 256;

#[derive(Debug, Default)]
struct LatencyTrack {
    samples: VecDeque<f64>,
    count: u64,
    sum_ms: f64,
}

impl LatencyTrack {
    fn record(&mut self, ms: f64) {
        self.count += 1;
        self.sum_ms += ms;
        if self.samples.len() == RESERVOIR_SIZE {
            self.samples.pop_front();
        }
        self.samples.push_back(ms);
    }

    fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum_ms / self.count as f64
        }
    }

    fn p95_ms(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.samples.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("latency samples are finite"));
        let rank = ((sorted.len() as f64) * 0.95).ceil() as usize;
        sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
    }
}

#[derive(Debug, Default)]
struct MetricsState {
    counters: BTreeMap<String, u64>,
    latencies: BTreeMap<String, LatencyTrack>,
    estimated_cost_usd: f64,
}

/// The process-wide metrics registry.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    state: Mutex<MetricsState>,
}

impl MetricsRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one.
    pub async fn incr(&self, name: &str) {
        self.incr_by(name, 1).await;
    }

    /// Increment a counter by `n`.
    pub async fn incr_by(&self, name: &str, n: u64) {
        let mut state = self.state.lock().await;
        *state.counters.entry(name.to_string()).or_default() += n;
    }

    /// Count one request by endpoint and outcome ("ok", "error", "cached",
    /// "rejected").
    pub async fn record_request(&self, endpoint: &str, outcome: &str) {
        self.incr(&format!("requests.{endpoint}.{outcome}")).await;
    }

    /// Count one error by stable code.
    pub async fn record_error(&self, code: ErrorCode) {
        self.incr(&format!("errors.{}", code.as_str())).await;
    }

    /// Record one upstream LLM call with its usage and estimated cost.
    pub async fn record_llm_call(&self, usage: &TokenUsage, cost_usd: f64) {
        let mut state = self.state.lock().await;
        *state
            .counters
            .entry("openai.total_calls".to_string())
            .or_default() += 1;
        *state
            .counters
            .entry("openai.input_tokens".to_string())
            .or_default() += u64::from(usage.input_tokens);
        *state
            .counters
            .entry("openai.output_tokens".to_string())
            .or_default() += u64::from(usage.output_tokens);
        state.estimated_cost_usd += cost_usd;
    }

    /// Record a response latency for an endpoint.
    pub async fn record_latency(&self, endpoint: &str, elapsed: Duration) {
        let mut state = self.state.lock().await;
        state
            .latencies
            .entry(endpoint.to_string())
            .or_default()
            .record(elapsed.as_secs_f64() * 1000.0);
    }

    /// Read one counter (zero when never written).
    pub async fn counter(&self, name: &str) -> u64 {
        self.state
            .lock()
            .await
            .counters
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    /// Snapshot everything as JSON for the metrics endpoint.
    pub async fn snapshot(&self) -> serde_json::Value {
        let state = self.state.lock().await;

        let latencies: BTreeMap<String, serde_json::Value> = state
            .latencies
            .iter()
            .map(|(endpoint, track)| {
                (
                    endpoint.clone(),
                    serde_json::json!({
                        "count": track.count,
                        "mean_ms": track.mean_ms(),
                        "p95_ms": track.p95_ms(),
                    }),
                )
            })
            .collect();

        serde_json::json!({
            "counters": state.counters,
            "estimated_cost_usd": state.estimated_cost_usd,
            "response_times": latencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.record_request("generate", "ok").await;
        metrics.record_request("generate", "ok").await;
        metrics.record_request("generate", "error").await;

        assert_eq!(metrics.counter("requests.generate.ok").await, 2);
        assert_eq!(metrics.counter("requests.generate.error").await, 1);
        assert_eq!(metrics.counter("requests.health.ok").await, 0);
    }

    #[tokio::test]
    async fn error_codes_are_counted_by_wire_form() {
        let metrics = MetricsRegistry::new();
        metrics.record_error(ErrorCode::DescriptionTooShort).await;
        metrics.record_error(ErrorCode::DescriptionTooShort).await;
        assert_eq!(metrics.counter("errors.ERR_4010").await, 2);
    }

    #[tokio::test]
    async fn llm_calls_track_tokens_and_cost() {
        let metrics = MetricsRegistry::new();
        metrics
            .record_llm_call(
                &TokenUsage {
                    input_tokens: 1000,
                    output_tokens: 500,
                },
                0.0125,
            )
            .await;
        metrics
            .record_llm_call(
                &TokenUsage {
                    input_tokens: 200,
                    output_tokens: 100,
                },
                0.0025,
            )
            .await;

        assert_eq!(metrics.counter("openai.total_calls").await, 2);
        assert_eq!(metrics.counter("openai.input_tokens").await, 1200);
        assert_eq!(metrics.counter("openai.output_tokens").await, 600);

        let snapshot = metrics.snapshot().await;
        let cost = snapshot["estimated_cost_usd"].as_f64().unwrap();
        assert!((cost - 0.015).abs() < 1e-9);
    }

    #[tokio::test]
    async fn latency_mean_and_p95() {
        let metrics = MetricsRegistry::new();
        for ms in [10u64, 20, 30, 40, 1000] {
            metrics
                .record_latency("generate", Duration::from_millis(ms))
                .await;
        }

        let snapshot = metrics.snapshot().await;
        let stats = &snapshot["response_times"]["generate"];
        assert_eq!(stats["count"], 5);
        let mean = stats["mean_ms"].as_f64().unwrap();
        assert!((mean - 220.0).abs() < 1.0);
        let p95 = stats["p95_ms"].as_f64().unwrap();
        assert!((p95 - 1000.0).abs() < 1.0);
    }

    #[tokio::test]
    async fn latency_reservoir_is_bounded() {
        let metrics = MetricsRegistry::new();
        for i in 0..1000u64 {
            metrics
                .record_latency("x", Duration::from_millis(i))
                .await;
        }
        let state = metrics.state.lock().await;
        let track = state.latencies.get("x").unwrap();
        assert_eq!(track.samples.len(), RESERVOIR_SIZE);
        assert_eq!(track.count, 1000);
    }

    #[tokio::test]
    async fn snapshot_shape() {
        let metrics = MetricsRegistry::new();
        metrics.incr("cache.hits").await;
        let snapshot = metrics.snapshot().await;
        assert_eq!(snapshot["counters"]["cache.hits"], 1);
        assert!(snapshot["response_times"].is_object());
    }
}
