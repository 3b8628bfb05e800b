//! Basic metrics instrumentation for tracking performance.
//!
//! Provides counters for upstream fetches, cache effectiveness, session churn
//! and inbound requests.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Metrics collector shared by the client, caches and session registry.
#[derive(Debug, Clone)]
pub struct Metrics {
    /// Total number of upstream HTTP requests made
    http_requests_total: Arc<AtomicU64>,

    /// Total number of upstream HTTP errors
    http_errors_total: Arc<AtomicU64>,

    /// Total duration of all upstream requests in milliseconds
    http_duration_total_ms: Arc<AtomicU64>,

    cache_hits_total: Arc<AtomicU64>,
    cache_misses_total: Arc<AtomicU64>,

    /// Number of normalized tokens fetched from upstream lists
    tokens_fetched_total: Arc<AtomicU64>,

    sessions_created_total: Arc<AtomicU64>,
    sessions_expired_total: Arc<AtomicU64>,

    /// Inbound JSON-RPC requests on the HTTP transport
    rpc_requests_total: Arc<AtomicU64>,
    rpc_errors_total: Arc<AtomicU64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            http_requests_total: Arc::new(AtomicU64::new(0)),
            http_errors_total: Arc::new(AtomicU64::new(0)),
            http_duration_total_ms: Arc::new(AtomicU64::new(0)),
            cache_hits_total: Arc::new(AtomicU64::new(0)),
            cache_misses_total: Arc::new(AtomicU64::new(0)),
            tokens_fetched_total: Arc::new(AtomicU64::new(0)),
            sessions_created_total: Arc::new(AtomicU64::new(0)),
            sessions_expired_total: Arc::new(AtomicU64::new(0)),
            rpc_requests_total: Arc::new(AtomicU64::new(0)),
            rpc_errors_total: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Record an upstream request with duration.
    pub fn record_http_request(&self, duration: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_duration_total_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    /// Record an upstream error.
    pub fn record_http_error(&self) {
        self.http_errors_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a cache lookup outcome.
    pub fn record_cache_access(&self, cache: &str, hit: bool) {
        if hit {
            self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(cache = %cache, "Cache hit");
        } else {
            self.cache_misses_total.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(cache = %cache, "Cache miss");
        }
    }

    /// Record tokens fetched.
    pub fn record_tokens_fetched(&self, count: usize) {
        self.tokens_fetched_total
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_session_created(&self) {
        self.sessions_created_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_expired(&self) {
        self.sessions_expired_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an inbound request and whether it was answered with an error status.
    pub fn record_rpc_request(&self, failed: bool) {
        self.rpc_requests_total.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.rpc_errors_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get total upstream requests.
    pub fn http_requests_total(&self) -> u64 {
        self.http_requests_total.load(Ordering::Relaxed)
    }

    /// Get total upstream errors.
    pub fn http_errors_total(&self) -> u64 {
        self.http_errors_total.load(Ordering::Relaxed)
    }

    /// Get total upstream duration in milliseconds.
    pub fn http_duration_total_ms(&self) -> u64 {
        self.http_duration_total_ms.load(Ordering::Relaxed)
    }

    /// Get average upstream request duration in milliseconds.
    pub fn http_duration_avg_ms(&self) -> f64 {
        let total = self.http_duration_total_ms.load(Ordering::Relaxed);
        let count = self.http_requests_total.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    pub fn cache_hits_total(&self) -> u64 {
        self.cache_hits_total.load(Ordering::Relaxed)
    }

    pub fn cache_misses_total(&self) -> u64 {
        self.cache_misses_total.load(Ordering::Relaxed)
    }

    pub fn tokens_fetched_total(&self) -> u64 {
        self.tokens_fetched_total.load(Ordering::Relaxed)
    }

    pub fn sessions_created_total(&self) -> u64 {
        self.sessions_created_total.load(Ordering::Relaxed)
    }

    pub fn sessions_expired_total(&self) -> u64 {
        self.sessions_expired_total.load(Ordering::Relaxed)
    }

    pub fn rpc_requests_total(&self) -> u64 {
        self.rpc_requests_total.load(Ordering::Relaxed)
    }

    pub fn rpc_errors_total(&self) -> u64 {
        self.rpc_errors_total.load(Ordering::Relaxed)
    }

    /// Get a summary of all metrics.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            http_requests_total: self.http_requests_total(),
            http_errors_total: self.http_errors_total(),
            http_duration_total_ms: self.http_duration_total_ms(),
            http_duration_avg_ms: self.http_duration_avg_ms(),
            cache_hits_total: self.cache_hits_total(),
            cache_misses_total: self.cache_misses_total(),
            tokens_fetched_total: self.tokens_fetched_total(),
            sessions_created_total: self.sessions_created_total(),
            sessions_expired_total: self.sessions_expired_total(),
            rpc_requests_total: self.rpc_requests_total(),
            rpc_errors_total: self.rpc_errors_total(),
        }
    }
}

/// A snapshot of metrics values.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub http_duration_total_ms: u64,
    pub http_duration_avg_ms: f64,
    pub cache_hits_total: u64,
    pub cache_misses_total: u64,
    pub tokens_fetched_total: u64,
    pub sessions_created_total: u64,
    pub sessions_expired_total: u64,
    pub rpc_requests_total: u64,
    pub rpc_errors_total: u64,
}
