use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::domain::{AccountBaseline, AdSummary, Metric, MetricBaseline};

/// Computes account-level per-metric statistics from a set of `AdSummary`s.
///
/// Mean is spend-weighted for every metric; standard deviation is the
/// **population** variant (divide by `count`, not `count - 1`) so it stays
/// stable as the sample grows instead of drifting toward a sample estimate.
pub struct BaselineEngine {
    pub min_sample_size: usize,
}

impl BaselineEngine {
    pub fn new(min_sample_size: usize) -> Self {
        Self { min_sample_size }
    }

    pub fn compute(&self, summaries: &[AdSummary]) -> AccountBaseline {
        let mut baseline = AccountBaseline::default();
        for metric in Metric::ALL {
            if let Some(stats) = self.compute_metric(summaries, metric) {
                baseline.metrics.insert(metric, stats);
            }
        }
        baseline
    }

    fn compute_metric(&self, summaries: &[AdSummary], metric: Metric) -> Option<MetricBaseline> {
        let mut pairs: Vec<(f64, f64)> = Vec::new(); // (value, spend_weight)
        let mut plain: Vec<f64> = Vec::new();

        for s in summaries {
            if let Some(v) = s.metric_value(metric) {
                let value = v.to_f64()?;
                let weight = s.spend.to_f64().unwrap_or(0.0).max(0.0);
                pairs.push((value, weight));
                plain.push(value);
            }
        }

        if pairs.is_empty() {
            return None;
        }

        let total_weight: f64 = pairs.iter().map(|(_, w)| w).sum();
        let mean = if total_weight > 0.0 {
            pairs.iter().map(|(v, w)| v * w).sum::<f64>() / total_weight
        } else {
            plain.iter().sum::<f64>() / plain.len() as f64
        };

        let variance = if total_weight > 0.0 {
            pairs
                .iter()
                .map(|(v, w)| w * (v - mean).powi(2))
                .sum::<f64>()
                / total_weight
        } else {
            plain.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / plain.len() as f64
        };
        let stdev = variance.sqrt();

        let mut sorted = plain.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = if sorted.len() % 2 == 0 {
            (sorted[sorted.len() / 2 - 1] + sorted[sorted.len() / 2]) / 2.0
        } else {
            sorted[sorted.len() / 2]
        };

        let count = plain.len();
        let sufficient = count >= self.min_sample_size;

        debug!(
            metric = ?metric,
            count,
            mean,
            stdev,
            sufficient,
            "computed account baseline for metric"
        );

        Some(MetricBaseline {
            mean,
            stdev,
            median,
            count,
            sufficient,
        })
    }
}

impl Default for BaselineEngine {
    fn default() -> Self {
        Self::new(10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdRecord, Provider};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn summary(spend: f64, roas: f64) -> AdSummary {
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let rec = AdRecord {
            ad_id: "a".into(),
            tenant: "t".into(),
            provider: Provider::GoogleAds,
            date: d,
            spend: rust_decimal::Decimal::try_from(spend).unwrap(),
            impressions: 1000,
            clicks: 10,
            conversions: 1,
            revenue: rust_decimal::Decimal::try_from(spend * roas).unwrap(),
            roas: rust_decimal::Decimal::try_from(roas).unwrap(),
            ctr: dec!(0.01),
            cpm: dec!(5.0),
            cpa: Some(dec!(10.0)),
            daily_budget: Some(dec!(500.0)),
        };
        AdSummary::from_records("a", &[rec])
    }

    #[test]
    fn population_stdev_not_sample() {
        let engine = BaselineEngine::new(1);
        let summaries: Vec<AdSummary> = vec![
            summary(100.0, 2.0),
            summary(100.0, 4.0),
        ];
        let baseline = engine.compute(&summaries);
        let roas = baseline.get(Metric::Roas).unwrap();
        // values [2.0, 4.0], mean 3.0, population variance = ((1)^2+(1)^2)/2 = 1.0, stdev = 1.0
        assert!((roas.stdev - 1.0).abs() < 1e-9);
    }

    #[test]
    fn insufficient_below_min_sample() {
        let engine = BaselineEngine::new(10);
        let summaries: Vec<AdSummary> = vec![summary(100.0, 2.0), summary(100.0, 3.0)];
        let baseline = engine.compute(&summaries);
        assert!(!baseline.is_sufficient(Metric::Roas));
    }
}
