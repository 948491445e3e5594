//! Access check metrics

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Snapshot of access check counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessMetrics {
    /// Checks that reached a decision or an error
    pub total_checks: u64,
    pub permitted: u64,
    pub denied: u64,
    /// Checks that ended in an error
    pub errors: u64,
    pub avg_latency_ms: f64,
    pub latency_p99_ms: f64,
}

impl AccessMetrics {
    pub fn permit_rate(&self) -> f64 {
        let total = self.permitted + self.denied;
        if total == 0 {
            0.0
        } else {
            self.permitted as f64 / total as f64
        }
    }
}

/// Collects access check outcomes and latencies
#[derive(Debug)]
pub struct MetricsCollector {
    permitted: AtomicU64,
    denied: AtomicU64,
    errors: AtomicU64,
    /// Recent latencies in milliseconds
    latency_samples: Mutex<Vec<f64>>,
    max_samples: usize,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            permitted: AtomicU64::new(0),
            denied: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            latency_samples: Mutex::new(Vec::with_capacity(1_024)),
            max_samples: 10_000,
        }
    }

    pub fn record_decision(&self, permitted: bool) {
        if permitted {
            self.permitted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.denied.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_latency(&self, latency: Duration) {
        let mut samples = self.latency_samples.lock();
        samples.push(latency.as_secs_f64() * 1000.0);

        // Keep only recent samples
        if samples.len() > self.max_samples {
            samples.drain(0..1_000);
        }
    }

    pub fn snapshot(&self) -> AccessMetrics {
        let permitted = self.permitted.load(Ordering::Relaxed);
        let denied = self.denied.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);

        let mut sorted = self.latency_samples.lock().clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let avg_latency_ms = if sorted.is_empty() {
            0.0
        } else {
            sorted.iter().sum::<f64>() / sorted.len() as f64
        };

        AccessMetrics {
            total_checks: permitted + denied + errors,
            permitted,
            denied,
            errors,
            avg_latency_ms,
            latency_p99_ms: percentile(&sorted, 0.99),
        }
    }

    pub fn reset(&self) {
        self.permitted.store(0, Ordering::Relaxed);
        self.denied.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
        self.latency_samples.lock().clear();
    }

    /// Export counters in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        let m = self.snapshot();

        format!(
            r#"# HELP access_checks_total Tenant scope access checks
# TYPE access_checks_total counter
access_checks_total{{outcome="permitted"}} {}
access_checks_total{{outcome="denied"}} {}
access_checks_total{{outcome="error"}} {}

# HELP access_check_latency_seconds Access check latency
# TYPE access_check_latency_seconds summary
access_check_latency_seconds{{quantile="0.99"}} {}
"#,
            m.permitted,
            m.denied,
            m.errors,
            m.latency_p99_ms / 1000.0,
        )
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = ((sorted.len() as f64 - 1.0) * p).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}
