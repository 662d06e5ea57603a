//! Prometheus metrics for admission decisions

use anyhow::Result;
use prometheus::{Counter, CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Duration;

use crate::chain::Operation;

/// Counters and latency of seed admission reviews
#[derive(Clone)]
pub struct AdmissionMetrics {
    /// Reviews by operation and outcome
    pub requests_total: CounterVec,
    /// Time spent deciding a review
    pub duration_seconds: Histogram,
    /// Cluster or seed queries that failed, timed out or were cancelled
    pub query_failures_total: Counter,
    pub registry: Arc<Registry>,
}

impl AdmissionMetrics {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let requests_total = CounterVec::new(
            Opts::new("seed_admission_requests_total", "Seed admission reviews"),
            &["operation", "allowed"],
        )?;

        let duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "seed_admission_duration_seconds",
            "Seed admission review latency in seconds",
        ))?;

        let query_failures_total = Counter::new(
            "seed_admission_query_failures_total",
            "Topology queries that failed during admission",
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(duration_seconds.clone()))?;
        registry.register(Box::new(query_failures_total.clone()))?;

        Ok(Self {
            requests_total,
            duration_seconds,
            query_failures_total,
            registry,
        })
    }

    pub fn observe(&self, op: Operation, allowed: bool, elapsed: Duration) {
        self.requests_total
            .with_label_values(&[op.as_str(), if allowed { "true" } else { "false" }])
            .inc();
        self.duration_seconds.observe(elapsed.as_secs_f64());
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
