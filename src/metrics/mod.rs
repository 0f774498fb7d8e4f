// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::{metrics_handler, track_requests};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Each service owns one registry, scraped via GET /metrics:
// - ServiceMetrics    HTTP traffic (count and latency per route), both services
// - AnalyticsMetrics  event ingestion, stats mutations, malformed time-spent
// - ReviewMetrics     review creation
//
// Domain metrics register into the service's registry, so a service only
// exposes its own counters.
// ============================================================================

pub struct ServiceMetrics {
    registry: Registry,

    // HTTP Metrics
    pub http_requests: IntCounterVec,
    pub http_request_duration: HistogramVec,
}

impl ServiceMetrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests handled"),
            &["method", "route", "status"],
        )?;
        registry.register(Box::new(http_requests.clone()))?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request handling duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["method", "route"],
        )?;
        registry.register(Box::new(http_request_duration.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            http_request_duration,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16, duration_secs: f64) {
        self.http_requests
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
        self.http_request_duration
            .with_label_values(&[method, route])
            .observe(duration_secs);
    }
}

#[derive(Clone)]
pub struct AnalyticsMetrics {
    pub events_ingested: IntCounterVec,
    pub stats_mutations: IntCounterVec,
    pub malformed_minutes: IntCounter,
}

impl AnalyticsMetrics {
    pub fn register(registry: &Registry) -> anyhow::Result<Self> {
        let events_ingested = IntCounterVec::new(
            Opts::new("analytics_events_ingested_total", "Total events stored"),
            &["event_type"],
        )?;
        registry.register(Box::new(events_ingested.clone()))?;

        let stats_mutations = IntCounterVec::new(
            Opts::new("analytics_stats_mutations_total", "Total user stats mutations applied"),
            &["kind"],
        )?;
        registry.register(Box::new(stats_mutations.clone()))?;

        let malformed_minutes = IntCounter::new(
            "analytics_malformed_minutes_total",
            "time_spent events whose metadata was not a minute count",
        )?;
        registry.register(Box::new(malformed_minutes.clone()))?;

        Ok(Self {
            events_ingested,
            stats_mutations,
            malformed_minutes,
        })
    }

    pub fn record_event(&self, event_type: &str) {
        self.events_ingested.with_label_values(&[event_type]).inc();
    }

    pub fn record_mutation(&self, kind: &str) {
        self.stats_mutations.with_label_values(&[kind]).inc();
    }
}

#[derive(Clone)]
pub struct ReviewMetrics {
    pub reviews_created: IntCounter,
}

impl ReviewMetrics {
    pub fn register(registry: &Registry) -> anyhow::Result<Self> {
        let reviews_created = IntCounter::new("reviews_created_total", "Total reviews stored")?;
        registry.register(Box::new(reviews_created.clone()))?;
        Ok(Self { reviews_created })
    }
}
