use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Clone, Default)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Default)]
struct MetricsInner {
    requests_served: AtomicU64,
    requests_rejected: AtomicU64,
    internal_failures: AtomicU64,
    days_forecast: AtomicU64,
    longest_trip_days: AtomicU64,
}

impl MetricsRegistry {
    pub fn inc_requests_served(&self, delta: u64) {
        self.inner.requests_served.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_requests_rejected(&self, delta: u64) {
        self.inner.requests_rejected.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_internal_failures(&self, delta: u64) {
        self.inner.internal_failures.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn inc_days_forecast(&self, delta: u64) {
        self.inner.days_forecast.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn record_trip_days(&self, days: u64) {
        self.inner.longest_trip_days.fetch_max(days, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_served: self.inner.requests_served.load(Ordering::Relaxed),
            requests_rejected: self.inner.requests_rejected.load(Ordering::Relaxed),
            internal_failures: self.inner.internal_failures.load(Ordering::Relaxed),
            days_forecast: self.inner.days_forecast.load(Ordering::Relaxed),
            longest_trip_days: self.inner.longest_trip_days.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub requests_served: u64,
    pub requests_rejected: u64,
    pub internal_failures: u64,
    pub days_forecast: u64,
    pub longest_trip_days: u64,
}

impl MetricsSnapshot {
    pub fn to_json_line(&self, label: &str, elapsed: Option<Duration>) -> String {
        #[derive(Serialize)]
        struct Snapshot<'a> {
            label: &'a str,
            #[serde(flatten)]
            counters: &'a MetricsSnapshot,
            elapsed_ms: Option<u128>,
        }

        let payload = Snapshot {
            label,
            counters: self,
            elapsed_ms: elapsed.map(|d| d.as_millis()),
        };
        serde_json::to_string(&payload).unwrap_or_else(|_| String::from("{}"))
    }
}

pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
