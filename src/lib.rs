//! Advertising anomaly detection and root-cause diagnosis.
//!
//! `domain` holds the core entities; `engine` derives baselines and detects
//! anomalies from them; `probes` and `rca` diagnose why an anomaly happened;
//! `recommend` and `execution` turn a diagnosis into a simulated action;
//! `pipeline` wires all of it into the three operations (`analyze`,
//! `recommend`, `execute`) that `api` and `cli` expose to the outside world.

pub mod agents;
pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod observability;
pub mod pipeline;
pub mod probes;
pub mod rca;
pub mod recommend;
pub mod session_store;
pub mod storage;
pub mod validation;

pub use config::{Config, RcaConfig};
pub use domain::{
    AccountBaseline, Action, AdRecord, AdSummary, Anomaly, Confidence, Evidence, Metric,
    MetricBaseline, Polarity, ProbeDetail, ProbeKind, Provider, RcaError, Recommendation, Result,
    RootCauseTag, RootCauseVerdict, Session, SessionId, Severity,
};
pub use engine::{AnomalyDetector, AnomalyDetectorConfig, BaselineEngine};
pub use pipeline::{AnalyzeSummary, Pipeline, RecommendSummary};
pub use rca::{DeterministicModelClient, ModelClient, OrchestratorConfig, RcaOrchestrator};
pub use session_store::SessionStore;
pub use storage::{InMemoryMetricStore, MetricStoreAdapter, WarehouseMetricStore};
