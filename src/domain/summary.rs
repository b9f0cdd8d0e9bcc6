use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ad_record::{AdRecord, Metric};
use super::provider::Provider;

/// Per-ad aggregate over the analysis window.
///
/// `roas` is always `Σ(roas · spend) / Σ(spend)` over the ad's own daily
/// records, never independently reconstructed from revenue totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdSummary {
    pub ad_id: String,
    pub provider: Provider,
    pub spend: Decimal,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: Decimal,
    pub roas: Decimal,
    pub ctr: Decimal,
    pub cpm: Decimal,
    pub cpa: Option<Decimal>,
    pub daily_budget: Option<Decimal>,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
    /// Count of distinct calendar days with at least one record. Always >= 1.
    pub days_active: u32,
}

impl AdSummary {
    /// Build a summary from an ad's records within the analysis window.
    /// Panics if `records` is empty; callers must filter by ad_id first.
    pub fn from_records(ad_id: &str, records: &[AdRecord]) -> Self {
        assert!(!records.is_empty(), "AdSummary requires at least one record");

        let provider = records[0].provider;
        let mut spend = Decimal::ZERO;
        let mut impressions: u64 = 0;
        let mut clicks: u64 = 0;
        let mut conversions: u64 = 0;
        let mut revenue = Decimal::ZERO;
        let mut roas_weighted = Decimal::ZERO;
        let mut ctr_weighted = Decimal::ZERO;
        let mut cpm_weighted = Decimal::ZERO;
        let mut cpa_weighted = Decimal::ZERO;
        let mut cpa_weight = Decimal::ZERO;
        let mut first_seen = records[0].date;
        let mut last_seen = records[0].date;
        let mut dates = std::collections::HashSet::new();
        let mut daily_budget = None;

        for r in records {
            spend += r.spend;
            impressions += r.impressions;
            clicks += r.clicks;
            conversions += r.conversions;
            revenue += r.revenue;
            roas_weighted += r.roas * r.spend;
            ctr_weighted += r.ctr * r.spend;
            cpm_weighted += r.cpm * r.spend;
            if let Some(cpa) = r.cpa {
                cpa_weighted += cpa * r.spend;
                cpa_weight += r.spend;
            }
            if r.date < first_seen {
                first_seen = r.date;
            }
            if r.date > last_seen {
                last_seen = r.date;
            }
            dates.insert(r.date);
            if r.daily_budget.is_some() {
                daily_budget = r.daily_budget;
            }
        }

        let roas = if spend.is_zero() {
            Decimal::ZERO
        } else {
            roas_weighted / spend
        };
        let ctr = if spend.is_zero() {
            Decimal::ZERO
        } else {
            ctr_weighted / spend
        };
        let cpm = if spend.is_zero() {
            Decimal::ZERO
        } else {
            cpm_weighted / spend
        };
        let cpa = if cpa_weight.is_zero() {
            None
        } else {
            Some(cpa_weighted / cpa_weight)
        };

        AdSummary {
            ad_id: ad_id.to_string(),
            provider,
            spend,
            impressions,
            clicks,
            conversions,
            revenue,
            roas,
            ctr,
            cpm,
            cpa,
            daily_budget,
            first_seen,
            last_seen,
            days_active: dates.len() as u32,
        }
    }

    pub fn metric_value(&self, metric: Metric) -> Option<Decimal> {
        match metric {
            Metric::Spend => Some(self.spend),
            Metric::Roas => Some(self.roas),
            Metric::Cpa => self.cpa,
            Metric::Ctr => Some(self.ctr),
            Metric::Cpm => Some(self.cpm),
        }
    }
}
