//! Derives account baselines and detects anomalous ads from ad summaries.

pub mod anomaly_detector;
pub mod baseline_engine;

pub use anomaly_detector::{AnomalyDetector, AnomalyDetectorConfig};
pub use baseline_engine::BaselineEngine;
