use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::provider::Provider;

/// A metric tracked by the baseline engine, anomaly detector and probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Spend,
    Roas,
    Cpa,
    Ctr,
    Cpm,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::Spend,
        Metric::Roas,
        Metric::Cpa,
        Metric::Ctr,
        Metric::Cpm,
    ];

    /// Whether a *higher* value is unambiguously bad for this metric.
    /// `None` means polarity depends on the direction of the deviation, not the metric alone.
    pub fn bad_when_high(&self) -> Option<bool> {
        match self {
            Metric::Cpa | Metric::Cpm => Some(true),
            Metric::Roas => Some(false),
            Metric::Spend | Metric::Ctr => None,
        }
    }
}

/// A single immutable per-day, per-ad fact pulled from the metric store.
///
/// Numeric-string parse failures upstream cause the *record* to be dropped
/// before it reaches this type; `AdRecord` values are always well-formed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    pub ad_id: String,
    pub tenant: String,
    pub provider: Provider,
    pub date: NaiveDate,
    pub spend: Decimal,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub revenue: Decimal,
    /// Stored directly, never reconstructed from revenue/spend at summary time.
    pub roas: Decimal,
    pub ctr: Decimal,
    pub cpm: Decimal,
    pub cpa: Option<Decimal>,
    pub daily_budget: Option<Decimal>,
}

impl AdRecord {
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

/// One row as it arrives from the warehouse before type checking: every
/// numeric column is still a string, mirroring the source system's
/// safe-cast-prone columns (§9 Open Question 1).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAdRecord {
    pub ad_id: String,
    pub tenant: String,
    pub provider: String,
    pub date: String,
    pub spend: String,
    pub impressions: String,
    pub clicks: String,
    pub conversions: String,
    pub revenue: String,
    pub roas: String,
    pub ctr: String,
    pub cpm: String,
    pub cpa: Option<String>,
    pub daily_budget: Option<String>,
}

impl AdRecord {
    /// Parses a raw warehouse row into a well-formed `AdRecord`. Any column
    /// that fails to parse is a record-level failure: the whole record is
    /// dropped rather than the bad column being coerced to zero. Returns the
    /// reason for the caller to count and report (`AnalyzeSummary.records_dropped`),
    /// never a partially-defaulted record.
    pub fn try_from_raw(raw: &RawAdRecord) -> Result<AdRecord, String> {
        let parse_decimal = |field: &str, value: &str| -> Result<Decimal, String> {
            Decimal::from_str(value)
                .map_err(|e| format!("{} '{field}'='{value}': {e}", raw.ad_id))
        };
        let parse_u64 = |field: &str, value: &str| -> Result<u64, String> {
            u64::from_str(value).map_err(|e| format!("{} '{field}'='{value}': {e}", raw.ad_id))
        };

        let provider = Provider::from_str(&raw.provider)
            .map_err(|e| format!("{} 'provider'='{}': {e}", raw.ad_id, raw.provider))?;
        let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d")
            .map_err(|e| format!("{} 'date'='{}': {e}", raw.ad_id, raw.date))?;

        let cpa = match &raw.cpa {
            Some(s) if !s.is_empty() => Some(parse_decimal("cpa", s)?),
            _ => None,
        };
        let daily_budget = match &raw.daily_budget {
            Some(s) if !s.is_empty() => Some(parse_decimal("daily_budget", s)?),
            _ => None,
        };

        Ok(AdRecord {
            ad_id: raw.ad_id.clone(),
            tenant: raw.tenant.clone(),
            provider,
            date,
            spend: parse_decimal("spend", &raw.spend)?,
            impressions: parse_u64("impressions", &raw.impressions)?,
            clicks: parse_u64("clicks", &raw.clicks)?,
            conversions: parse_u64("conversions", &raw.conversions)?,
            revenue: parse_decimal("revenue", &raw.revenue)?,
            roas: parse_decimal("roas", &raw.roas)?,
            ctr: parse_decimal("ctr", &raw.ctr)?,
            cpm: parse_decimal("cpm", &raw.cpm)?,
            cpa,
            daily_budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(spend: &str) -> RawAdRecord {
        RawAdRecord {
            ad_id: "a1".into(),
            tenant: "acme".into(),
            provider: "google_ads".into(),
            date: "2026-01-01".into(),
            spend: spend.into(),
            impressions: "1000".into(),
            clicks: "10".into(),
            conversions: "1".into(),
            revenue: "300".into(),
            roas: "3.0".into(),
            ctr: "0.01".into(),
            cpm: "5.0".into(),
            cpa: Some("100".into()),
            daily_budget: Some("50".into()),
        }
    }

    #[test]
    fn well_formed_row_parses() {
        let record = AdRecord::try_from_raw(&raw("1000.00")).unwrap();
        assert_eq!(record.spend, Decimal::new(100000, 2));
    }

    #[test]
    fn malformed_numeric_column_drops_the_record_not_coerces_to_zero() {
        let err = AdRecord::try_from_raw(&raw("not-a-number")).unwrap_err();
        assert!(err.contains("spend"));
    }
}
