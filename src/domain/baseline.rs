use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ad_record::Metric;

/// Per-metric account-level statistics computed by the baseline engine.
///
/// `stdev` is the **population** standard deviation (divide by `count`, not
/// `count - 1`) so behavior stays stable as the sample grows rather than
/// asymptotically converging toward a sample estimate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MetricBaseline {
    pub mean: f64,
    pub stdev: f64,
    pub median: f64,
    pub count: usize,
    /// True once `count >= min_sample_size`.
    pub sufficient: bool,
}

/// Account-wide baseline, one `MetricBaseline` per tracked metric.
///
/// Ads missing a given metric are excluded only from that metric's baseline,
/// not from the account baseline as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBaseline {
    pub metrics: HashMap<Metric, MetricBaseline>,
}

impl AccountBaseline {
    pub fn get(&self, metric: Metric) -> Option<&MetricBaseline> {
        self.metrics.get(&metric)
    }

    pub fn is_sufficient(&self, metric: Metric) -> bool {
        self.metrics.get(&metric).map(|b| b.sufficient).unwrap_or(false)
    }
}
