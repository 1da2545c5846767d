//! Counters and timers recorded around every query.

use std::{
    collections::HashMap,
    fmt::Debug,
    sync::{Mutex, PoisonError},
    time::Duration,
};

pub const API_CALLS: &str = "airquality.api.calls";
pub const API_ERRORS: &str = "airquality.api.errors";
pub const API_LATENCY: &str = "airquality.api.latency";

pub trait MetricsSink: Send + Sync + Debug {
    fn increment_counter(&self, name: &str);
    fn record_duration(&self, name: &str, elapsed: Duration);
}

/// Emits every metric as a `tracing` debug event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsSink for TracingMetrics {
    fn increment_counter(&self, name: &str) {
        tracing::debug!(metric = name, "counter incremented");
    }

    fn record_duration(&self, name: &str, elapsed: Duration) {
        tracing::debug!(metric = name, elapsed_ms = elapsed.as_millis() as u64, "duration recorded");
    }
}

/// Keeps counters and duration samples in memory.
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    inner: Mutex<Recorded>,
}

#[derive(Debug, Default, Clone)]
struct Recorded {
    counters: HashMap<String, u64>,
    durations: HashMap<String, Vec<Duration>>,
}

impl InMemoryMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.recorded().counters.get(name).copied().unwrap_or(0)
    }

    pub fn durations(&self, name: &str) -> Vec<Duration> {
        self.recorded().durations.get(name).cloned().unwrap_or_default()
    }

    /// Counter names and values, sorted by name.
    pub fn counters(&self) -> Vec<(String, u64)> {
        let mut out: Vec<_> = self
            .recorded()
            .counters
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        out.sort();
        out
    }

    fn recorded(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetricsSink for InMemoryMetrics {
    fn increment_counter(&self, name: &str) {
        *self.recorded().counters.entry(name.to_string()).or_insert(0) += 1;
    }

    fn record_duration(&self, name: &str, elapsed: Duration) {
        self.recorded()
            .durations
            .entry(name.to_string())
            .or_default()
            .push(elapsed);
    }
}
