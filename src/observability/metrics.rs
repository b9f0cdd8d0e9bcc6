// Prometheus metrics registry for the RCA service.

use prometheus::{Gauge, Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::MetricsConfig;

const NAMESPACE: &str = "ad_rca";

/// Error type for metrics operations
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    RegistrationError(String),

    #[error("Failed to record metric: {0}")]
    RecordError(String),

    #[error("Failed to export metrics: {0}")]
    ExportError(String),

    #[error("Metric not found: {0}")]
    NotFound(String),
}

/// Global metrics registry for the `analyze` / `recommend` / `execute` pipeline.
pub struct MetricsRegistry {
    registry: Arc<Registry>,
    #[allow(dead_code)]
    config: MetricsConfig,

    // HTTP metrics
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,

    // Pipeline metrics
    pub analyses_total: IntCounterVec,
    pub analysis_duration_seconds: Histogram,
    pub anomalies_detected_total: IntCounterVec,
    pub diagnoses_total: IntCounterVec,
    pub diagnosis_duration_seconds: Histogram,
    pub probe_invocations_total: IntCounterVec,
    pub recommendations_total: IntCounterVec,
    pub execution_results_total: IntCounterVec,
    pub active_sessions: Gauge,

    // Database metrics
    pub db_queries_total: IntCounterVec,
    pub db_query_duration_seconds: HistogramVec,

    // System metrics
    pub uptime_seconds: Gauge,
    pub build_info: IntCounterVec,
}

impl MetricsRegistry {
    /// Create a new metrics registry
    pub fn new(config: MetricsConfig) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let http_requests_total = register_int_counter_vec(
            &registry,
            "http_requests_total",
            "Total HTTP requests",
            &["method", "path", "status"],
        )?;

        let http_request_duration_seconds = register_histogram_vec(
            &registry,
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
            &["method", "path"],
            config.latency_buckets.clone(),
        )?;

        let analyses_total = register_int_counter_vec(
            &registry,
            "analyses_total",
            "Total analyze() calls",
            &["tenant", "result"],
        )?;

        let analysis_duration_seconds = register_histogram(
            &registry,
            "analysis_duration_seconds",
            "analyze() wall-clock duration in seconds",
            config.latency_buckets.clone(),
        )?;

        let anomalies_detected_total = register_int_counter_vec(
            &registry,
            "anomalies_detected_total",
            "Total anomalies surfaced by the detector",
            &["metric", "severity"],
        )?;

        let diagnoses_total = register_int_counter_vec(
            &registry,
            "diagnoses_total",
            "Total RCA orchestrator diagnoses",
            &["tag", "confidence"],
        )?;

        let diagnosis_duration_seconds = register_histogram(
            &registry,
            "diagnosis_duration_seconds",
            "Per-anomaly diagnosis duration in seconds",
            config.latency_buckets.clone(),
        )?;

        let probe_invocations_total = register_int_counter_vec(
            &registry,
            "probe_invocations_total",
            "Total diagnostic probe invocations",
            &["probe", "fired"],
        )?;

        let recommendations_total = register_int_counter_vec(
            &registry,
            "recommendations_total",
            "Total recommendations generated, by action",
            &["action"],
        )?;

        let execution_results_total = register_int_counter_vec(
            &registry,
            "execution_results_total",
            "Total simulated execution outcomes",
            &["state"],
        )?;

        let active_sessions = register_gauge(&registry, "active_sessions", "Sessions currently held in memory")?;

        let db_queries_total = register_int_counter_vec(
            &registry,
            "db_queries_total",
            "Total warehouse queries",
            &["operation", "status"],
        )?;

        let db_query_duration_seconds = register_histogram_vec(
            &registry,
            "db_query_duration_seconds",
            "Warehouse query duration",
            &["operation"],
            config.latency_buckets.clone(),
        )?;

        let uptime_seconds = register_gauge(&registry, "uptime_seconds", "Process uptime in seconds")?;

        let build_info = register_int_counter_vec(
            &registry,
            "build_info",
            "Build information",
            &["version"],
        )?;
        build_info.with_label_values(&[env!("CARGO_PKG_VERSION")]).inc();

        if config.include_process_metrics {
            let process_collector = prometheus::process_collector::ProcessCollector::for_self();
            registry
                .register(Box::new(process_collector))
                .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
        }

        Ok(Self {
            registry: Arc::new(registry),
            config,
            http_requests_total,
            http_request_duration_seconds,
            analyses_total,
            analysis_duration_seconds,
            anomalies_detected_total,
            diagnoses_total,
            diagnosis_duration_seconds,
            probe_invocations_total,
            recommendations_total,
            execution_results_total,
            active_sessions,
            db_queries_total,
            db_query_duration_seconds,
            uptime_seconds,
            build_info,
        })
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::ExportError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::ExportError(e.to_string()))
    }

    /// Get the underlying registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }
}

fn register_int_counter_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<IntCounterVec, MetricsError> {
    let metric = IntCounterVec::new(Opts::new(name, help).namespace(NAMESPACE), labels)
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    registry
        .register(Box::new(metric.clone()))
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    Ok(metric)
}

fn register_histogram_vec(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
    buckets: Vec<f64>,
) -> Result<HistogramVec, MetricsError> {
    let metric = HistogramVec::new(
        HistogramOpts::new(name, help).namespace(NAMESPACE).buckets(buckets),
        labels,
    )
    .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    registry
        .register(Box::new(metric.clone()))
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    Ok(metric)
}

fn register_histogram(
    registry: &Registry,
    name: &str,
    help: &str,
    buckets: Vec<f64>,
) -> Result<Histogram, MetricsError> {
    let metric = Histogram::with_opts(HistogramOpts::new(name, help).namespace(NAMESPACE).buckets(buckets))
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    registry
        .register(Box::new(metric.clone()))
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    Ok(metric)
}

fn register_gauge(registry: &Registry, name: &str, help: &str) -> Result<Gauge, MetricsError> {
    let metric = Gauge::with_opts(Opts::new(name, help).namespace(NAMESPACE))
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    registry
        .register(Box::new(metric.clone()))
        .map_err(|e| MetricsError::RegistrationError(e.to_string()))?;
    Ok(metric)
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    histogram: Histogram,
}

impl Timer {
    /// Create a new timer
    pub fn new(histogram: Histogram) -> Self {
        Self {
            start: Instant::now(),
            histogram,
        }
    }

    /// Observe the elapsed time and record it
    pub fn observe_duration(self) -> Duration {
        let duration = self.start.elapsed();
        self.histogram.observe(duration.as_secs_f64());
        duration
    }
}

/// Helper to create a timer from a histogram
pub fn start_timer(histogram: &Histogram) -> Timer {
    Timer::new(histogram.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registry_creation() {
        let config = MetricsConfig::default();
        let registry = MetricsRegistry::new(config);
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_export() {
        let config = MetricsConfig::default();
        let registry = MetricsRegistry::new(config).unwrap();

        registry
            .http_requests_total
            .with_label_values(&["POST", "/v1/analyze", "200"])
            .inc();

        let exported = registry.export().unwrap();
        assert!(exported.contains("ad_rca_http_requests_total"));
    }

    #[test]
    fn test_pipeline_metrics() {
        let config = MetricsConfig::default();
        let registry = MetricsRegistry::new(config).unwrap();

        registry
            .analyses_total
            .with_label_values(&["acme", "ok"])
            .inc();
        registry
            .anomalies_detected_total
            .with_label_values(&["roas", "extreme"])
            .inc();
        registry
            .diagnoses_total
            .with_label_values(&["cpm_spike", "high"])
            .inc();
        registry.active_sessions.set(3.0);

        let exported = registry.export().unwrap();
        assert!(exported.contains("ad_rca_analyses_total"));
        assert!(exported.contains("ad_rca_anomalies_detected_total"));
        assert!(exported.contains("ad_rca_diagnoses_total"));
        assert!(exported.contains("ad_rca_active_sessions"));
    }

    #[test]
    fn test_timer() {
        let config = MetricsConfig::default();
        let registry = MetricsRegistry::new(config).unwrap();

        let timer = start_timer(&registry.analysis_duration_seconds);
        std::thread::sleep(Duration::from_millis(10));
        let duration = timer.observe_duration();

        assert!(duration.as_millis() >= 10);
    }
}
