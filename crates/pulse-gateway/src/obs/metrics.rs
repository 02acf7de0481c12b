//! Application instruments.
//!
//! Registered once at startup on the shared registry; handles are kept here
//! so the Update Path never looks instruments up by name on the hot path.

use std::sync::Arc;
use std::time::Duration;

use pulse_core::error::Result;
use pulse_core::metrics::{Counter, Gauge, Histogram, Registry};

const REQUEST_LABELS: [&str; 3] = ["method", "route", "status_code"];

pub struct AppMetrics {
    pub http_request_duration: Arc<Histogram>, // milliseconds
    pub http_requests_total: Arc<Counter>,
    pub health_status: Arc<Gauge>,
    pub cpu_usage: Arc<Gauge>,
}

impl AppMetrics {
    pub fn register(registry: &Registry, latency_buckets_ms: &[f64]) -> Result<Self> {
        let http_request_duration = registry.register(Arc::new(Histogram::new(
            "http_request_duration_ms",
            "Duration of HTTP requests in milliseconds",
            &REQUEST_LABELS,
            latency_buckets_ms,
        )?))?;
        let http_requests_total = registry.register(Arc::new(Counter::new(
            "http_requests_total",
            "Total number of HTTP requests",
            &REQUEST_LABELS,
        )?))?;
        let health_status = registry.register(Arc::new(Gauge::new(
            "app_health_status",
            "Application health status (1 = healthy, 0 = unhealthy)",
            &[],
        )?))?;
        let cpu_usage = registry.register(Arc::new(Gauge::new(
            "app_cpu_usage_percent",
            "Application CPU usage percentage (simulated)",
            &[],
        )?))?;

        Ok(Self {
            http_request_duration,
            http_requests_total,
            health_status,
            cpu_usage,
        })
    }

    /// Record one finished request.
    pub fn record_request(
        &self,
        method: &str,
        route: &str,
        status: u16,
        elapsed: Duration,
    ) -> Result<()> {
        let status = status.to_string();
        let labels = [("method", method), ("route", route), ("status_code", status.as_str())];
        self.http_request_duration.observe_duration(&labels, elapsed)?;
        self.http_requests_total.inc(&labels)
    }

    pub fn set_healthy(&self, healthy: bool) -> Result<()> {
        self.health_status.set(&[], if healthy { 1.0 } else { 0.0 })
    }

    pub fn set_cpu(&self, percent: f64) -> Result<()> {
        self.cpu_usage.set(&[], percent)
    }

    pub fn cpu(&self) -> f64 {
        self.cpu_usage.get(&[]).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_request_feeds_both_instruments() {
        let r = Registry::new();
        let m = AppMetrics::register(&r, &[50.0, 100.0]).unwrap();
        m.record_request("GET", "/health", 503, Duration::from_millis(70)).unwrap();
        m.record_request("GET", "/health", 503, Duration::from_millis(20)).unwrap();

        let labels = [("method", "GET"), ("route", "/health"), ("status_code", "503")];
        assert_eq!(m.http_requests_total.get(&labels).unwrap(), 2.0);
        let s = m.http_request_duration.snapshot(&labels).unwrap().unwrap();
        assert_eq!(s.bucket(50.0), Some(1));
        assert_eq!(s.bucket(100.0), Some(2));
        assert_eq!(s.sum, 90.0);
    }

    #[test]
    fn registering_twice_fails() {
        let r = Registry::new();
        AppMetrics::register(&r, &[1.0]).unwrap();
        assert!(AppMetrics::register(&r, &[1.0]).is_err());
    }
}
