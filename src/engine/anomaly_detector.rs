use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::domain::{AccountBaseline, AdSummary, Anomaly, Metric, Polarity, Severity};

#[derive(Debug, Clone)]
pub struct AnomalyDetectorConfig {
    pub threshold_sigma: f64,
    pub min_spend: Decimal,
    pub max_anomalies_per_metric: usize,
}

impl Default for AnomalyDetectorConfig {
    fn default() -> Self {
        Self {
            threshold_sigma: 2.0,
            min_spend: Decimal::new(100_00, 2), // $100.00
            max_anomalies_per_metric: 50,
        }
    }
}

pub struct AnomalyDetector {
    config: AnomalyDetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: AnomalyDetectorConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, summaries: &[AdSummary], baseline: &AccountBaseline) -> Vec<Anomaly> {
        let mut all = Vec::new();

        for metric in Metric::ALL {
            let Some(stats) = baseline.get(metric) else {
                continue;
            };
            if !stats.sufficient || stats.stdev <= 1e-6 {
                // Uniform baseline: no meaningful deviation is possible.
                continue;
            }

            let mut per_metric = Vec::new();
            for s in summaries {
                if s.spend < self.config.min_spend {
                    continue;
                }
                let Some(value) = s.metric_value(metric) else {
                    continue;
                };
                let Some(value_f) = value.to_f64() else {
                    continue;
                };
                let z = (value_f - stats.mean) / stats.stdev;
                let abs_z = z.abs();
                if abs_z < self.config.threshold_sigma {
                    continue;
                }

                let severity = Severity::from_abs_z(abs_z);
                let polarity = polarity_for(metric, z);

                // Bad-only filter: only a deviation that is at least
                // "significant" and not unambiguously good is emitted as an
                // Anomaly at all. Good-polarity deviations are never surfaced
                // here, even informatively.
                if severity < Severity::Significant || polarity == Polarity::Good {
                    continue;
                }

                per_metric.push(Anomaly {
                    ad_id: s.ad_id.clone(),
                    metric,
                    value,
                    spend: s.spend,
                    z_score: z,
                    severity,
                    polarity,
                });
            }

            // Tie-break: |z| descending, then spend descending.
            per_metric.sort_by(|a, b| {
                b.z_score
                    .abs()
                    .partial_cmp(&a.z_score.abs())
                    .unwrap()
                    .then_with(|| b.spend.cmp(&a.spend))
            });
            per_metric.truncate(self.config.max_anomalies_per_metric);

            all.extend(per_metric);
        }

        all
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(AnomalyDetectorConfig::default())
    }
}

fn polarity_for(metric: Metric, z: f64) -> Polarity {
    match metric.bad_when_high() {
        Some(true) => {
            if z > 0.0 {
                Polarity::Bad
            } else {
                Polarity::Good
            }
        }
        Some(false) => {
            if z > 0.0 {
                Polarity::Good
            } else {
                Polarity::Bad
            }
        }
        None => Polarity::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdRecord, Provider};
    use crate::engine::baseline_engine::BaselineEngine;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn summary(ad_id: &str, spend: Decimal, roas: Decimal) -> AdSummary {
        let d = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let rec = AdRecord {
            ad_id: ad_id.into(),
            tenant: "t".into(),
            provider: Provider::GoogleAds,
            date: d,
            spend,
            impressions: 1000,
            clicks: 10,
            conversions: 1,
            revenue: spend * roas,
            roas,
            ctr: dec!(0.01),
            cpm: dec!(5.0),
            cpa: Some(dec!(10.0)),
            daily_budget: Some(dec!(500.0)),
        };
        AdSummary::from_records(ad_id, &[rec])
    }

    #[test]
    fn zero_roas_is_bad_and_extreme() {
        let mut summaries: Vec<AdSummary> = (0..11)
            .map(|i| summary(&format!("normal{i}"), dec!(200.0), dec!(6.88)))
            .collect();
        summaries.push(summary("zero", dec!(88000.0), dec!(0.0)));

        let baseline = BaselineEngine::new(10).compute(&summaries);
        let detector = AnomalyDetector::default();
        let anomalies = detector.detect(&summaries, &baseline);

        let found = anomalies
            .iter()
            .find(|a| a.ad_id == "zero" && a.metric == Metric::Roas)
            .expect("zero-roas anomaly");
        assert_eq!(found.polarity, Polarity::Bad);
        assert_eq!(found.severity, Severity::Extreme);
    }

    #[test]
    fn good_polarity_is_never_emitted() {
        let mut summaries: Vec<AdSummary> = (0..11)
            .map(|i| summary(&format!("normal{i}"), dec!(200.0), dec!(6.88)))
            .collect();
        summaries.push(summary("winner", dec!(212000.0), dec!(29.58)));

        let baseline = BaselineEngine::new(10).compute(&summaries);
        let detector = AnomalyDetector::default();
        let anomalies = detector.detect(&summaries, &baseline);
        assert!(!anomalies.iter().any(|a| a.ad_id == "winner"));
    }
}
