use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ad_record::Metric;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Significant,
    Extreme,
}

impl Severity {
    /// Classify `|z|` into a severity band using the thresholds {1.5, 2.0, 3.0}.
    pub fn from_abs_z(abs_z: f64) -> Self {
        if abs_z >= 3.0 {
            Severity::Extreme
        } else if abs_z >= 2.0 {
            Severity::Significant
        } else {
            Severity::Mild
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Good,
    Bad,
    Unknown,
}

/// A detected deviation of one ad's metric from the account baseline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    pub ad_id: String,
    pub metric: Metric,
    pub value: Decimal,
    pub spend: Decimal,
    pub z_score: f64,
    pub severity: Severity,
    pub polarity: Polarity,
}

impl Anomaly {
    /// Severity >= significant and polarity not good: the set the orchestrator
    /// is allowed to diagnose. Good-polarity deviations (e.g. unusually high
    /// ROAS) are informative but never drive root-cause analysis.
    pub fn is_actionable(&self) -> bool {
        self.severity >= Severity::Significant && self.polarity != Polarity::Good
    }
}
