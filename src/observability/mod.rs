//! Ambient observability: structured logging/tracing, Prometheus metrics,
//! and health checks. None of this carries domain logic; it is wired in at
//! the `analyze`/`recommend`/`execute` boundary and at the HTTP/CLI edges.

pub mod config;
pub mod health;
pub mod metrics;
pub mod tracing;

pub use config::{
    HealthConfig, LoggingConfig, LoggingFormat, MetricsConfig as ObservabilityMetricsConfig,
    ObservabilityConfig, OtlpConfig, TracingConfig, TracingFormat,
};
pub use health::{
    CacheHealthCheck, ComponentHealth, DatabaseHealthCheck, ExternalServiceHealthCheck,
    FunctionHealthCheck, HealthCheck, HealthChecker, HealthStatus, SystemHealth,
};
pub use metrics::{start_timer, MetricsError, MetricsRegistry, Timer};
pub use tracing::{
    create_span_with_context, debug_span_with_context, error_span_with_context,
    extract_trace_context_from_headers, info_span_with_context, init_tracing,
    inject_trace_context_into_headers, trace_span_with_context, warn_span_with_context,
    CorrelationId, RequestId, TraceContext, TraceContextLayer,
};

/// Initializes tracing with the default env-filter configuration. Entry
/// point for both the HTTP server and the CLI binary.
pub fn init_tracing_default() {
    let config = TracingConfig::default();
    if let Err(e) = init_tracing(&config) {
        eprintln!("failed to initialize tracing: {e}");
    }
}
