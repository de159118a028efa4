//! Prometheus metrics.
//!
//! `Metrics` owns its registry and is handed to whatever records into it,
//! so nothing here is process-global and tests get isolated counters.

use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

use crate::store::PoolStats;

pub struct Metrics {
    registry: Registry,

    // === HTTP Request Metrics ===
    /// HTTP requests by method, route pattern, and status
    pub http_requests_total: IntCounterVec,
    /// HTTP request duration by method, route pattern, and status
    pub http_request_duration: HistogramVec,
    /// Requests currently being served
    pub http_requests_in_flight: IntGauge,

    // === Auth Metrics ===
    /// Authentication attempts by type (signup/signin/refresh) and status
    pub auth_attempts_total: IntCounterVec,
    /// Token pairs and refreshed access tokens issued
    pub jwt_tokens_issued_total: IntCounter,
    /// Bearer token validations by outcome (valid/invalid/expired)
    pub jwt_tokens_validated_total: IntCounterVec,

    // === Database Metrics ===
    pub db_connections_active: IntGauge,
    pub db_connections_idle: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            ),
            &["method", "path", "status"],
        )?;
        let http_requests_in_flight = IntGauge::new(
            "http_requests_in_flight",
            "Number of HTTP requests currently being served",
        )?;
        let auth_attempts_total = IntCounterVec::new(
            Opts::new("auth_attempts_total", "Total number of authentication attempts"),
            &["type", "status"],
        )?;
        let jwt_tokens_issued_total =
            IntCounter::new("jwt_tokens_issued_total", "Total number of JWT tokens issued")?;
        let jwt_tokens_validated_total = IntCounterVec::new(
            Opts::new(
                "jwt_tokens_validated_total",
                "Total number of JWT token validations",
            ),
            &["status"],
        )?;
        let db_connections_active = IntGauge::new(
            "db_connections_active",
            "Number of active database connections",
        )?;
        let db_connections_idle = IntGauge::new(
            "db_connections_idle",
            "Number of idle database connections",
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(auth_attempts_total.clone()))?;
        registry.register(Box::new(jwt_tokens_issued_total.clone()))?;
        registry.register(Box::new(jwt_tokens_validated_total.clone()))?;
        registry.register(Box::new(db_connections_active.clone()))?;
        registry.register(Box::new(db_connections_idle.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration,
            http_requests_in_flight,
            auth_attempts_total,
            jwt_tokens_issued_total,
            jwt_tokens_validated_total,
            db_connections_active,
            db_connections_idle,
        })
    }

    pub fn record_auth_attempt(&self, attempt: &str, success: bool) {
        let status = if success { "success" } else { "failure" };
        self.auth_attempts_total
            .with_label_values(&[attempt, status])
            .inc();
    }

    pub fn record_token_issued(&self) {
        self.jwt_tokens_issued_total.inc();
    }

    pub fn record_token_validation(&self, status: &str) {
        self.jwt_tokens_validated_total
            .with_label_values(&[status])
            .inc();
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        let labels = [method, path, status.as_str()];
        self.http_requests_total.with_label_values(&labels).inc();
        self.http_request_duration
            .with_label_values(&labels)
            .observe(elapsed.as_secs_f64());
    }

    pub fn record_pool_stats(&self, stats: PoolStats) {
        self.db_connections_active.set(i64::from(stats.active));
        self.db_connections_idle.set(i64::from(stats.idle));
    }

    /// Text exposition of everything in the registry
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
