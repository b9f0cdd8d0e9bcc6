use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::warn;

use crate::domain::{AdRecord, AdSummary, Metric, RawAdRecord, Result};
use crate::probes::DailyPoint;

use super::adapter::MetricStoreAdapter;

/// In-memory metric store, the primary implementation used in tests and by
/// the CLI when no warehouse is configured. Holds every record for a tenant
/// and answers window queries by filtering on calendar date.
#[derive(Default)]
pub struct InMemoryMetricStore {
    records: RwLock<HashMap<String, Vec<AdRecord>>>,
    dropped: AtomicU64,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, tenant: &str, records: Vec<AdRecord>) {
        self.records
            .write()
            .unwrap()
            .entry(tenant.to_string())
            .or_default()
            .extend(records);
    }

    /// Parses each raw row, dropping (and counting) any that fail to parse
    /// rather than coercing a bad column to zero (§9 Open Question 1).
    pub fn seed_raw(&self, tenant: &str, raw_rows: Vec<RawAdRecord>) {
        let mut parsed = Vec::with_capacity(raw_rows.len());
        for raw in &raw_rows {
            match AdRecord::try_from_raw(raw) {
                Ok(record) => parsed.push(record),
                Err(reason) => {
                    warn!(tenant, reason, "dropping malformed ad record");
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        self.seed(tenant, parsed);
    }

    fn records_in_window(&self, tenant: &str, window_days: u32) -> Vec<AdRecord> {
        let today = Utc::now().date_naive();
        let cutoff = today - chrono::Duration::days(window_days as i64);
        self.records
            .read()
            .unwrap()
            .get(tenant)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| r.date > cutoff && r.date <= today)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl MetricStoreAdapter for InMemoryMetricStore {
    async fn fetch_ad_summaries(&self, tenant: &str, window_days: u32) -> Result<Vec<AdSummary>> {
        let records = self.records_in_window(tenant, window_days);
        let mut by_ad: HashMap<String, Vec<AdRecord>> = HashMap::new();
        for r in records {
            by_ad.entry(r.ad_id.clone()).or_default().push(r);
        }
        Ok(by_ad
            .iter()
            .map(|(ad_id, recs)| AdSummary::from_records(ad_id, recs))
            .filter(|summary| !summary.spend.is_zero())
            .collect())
    }

    async fn fetch_daily_series(
        &self,
        tenant: &str,
        ad_id: &str,
        metric: Metric,
        window_days: u32,
    ) -> Result<Vec<DailyPoint>> {
        let records = self.records_in_window(tenant, window_days);
        Ok(records
            .into_iter()
            .filter(|r| r.ad_id == ad_id)
            .filter_map(|r| {
                r.metric_value(metric)
                    .and_then(|v| v.to_f64())
                    .map(|value| DailyPoint { date: r.date, value })
            })
            .collect())
    }

    async fn fetch_account_daily_totals(
        &self,
        tenant: &str,
        metric: Metric,
        window_days: u32,
    ) -> Result<Vec<DailyPoint>> {
        let records = self.records_in_window(tenant, window_days);
        let mut by_date: HashMap<NaiveDate, (f64, f64)> = HashMap::new(); // (weighted value, spend)
        for r in &records {
            if let Some(v) = r.metric_value(metric).and_then(|v| v.to_f64()) {
                let spend = r.spend.to_f64().unwrap_or(0.0);
                let entry = by_date.entry(r.date).or_insert((0.0, 0.0));
                entry.0 += v * spend;
                entry.1 += spend;
            }
        }
        let mut out: Vec<DailyPoint> = by_date
            .into_iter()
            .map(|(date, (weighted, spend))| DailyPoint {
                date,
                value: if spend > 0.0 { weighted / spend } else { 0.0 },
            })
            .collect();
        out.sort_by_key(|p| p.date);
        Ok(out)
    }

    async fn fetch_recent_activity(
        &self,
        tenant: &str,
        ad_id: &str,
        trailing_days: u32,
    ) -> Result<(u64, u64)> {
        let today = Utc::now().date_naive();
        let cutoff = today - chrono::Duration::days(trailing_days as i64);
        let records = self.records.read().unwrap();
        let Some(all) = records.get(tenant) else {
            return Ok((0, 0));
        };
        let (clicks, conversions) = all
            .iter()
            .filter(|r| r.ad_id == ad_id && r.date > cutoff && r.date <= today)
            .fold((0u64, 0u64), |(c, v), r| (c + r.clicks, v + r.conversions));
        Ok((clicks, conversions))
    }

    fn dropped_record_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
