use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, Pool, Sqlite};

use crate::domain::{AdSummary, Metric, RcaError, Result};
use crate::probes::DailyPoint;

use super::adapter::{with_retry, MetricStoreAdapter};

/// Warehouse-backed metric store adapter.
///
/// Deliberately uses sqlx's runtime `query_as`/`bind` query builder rather
/// than the `query!`/`query_as!` compile-time-checked macros: those macros
/// need `DATABASE_URL` or an offline query cache available at build time,
/// which this table's schema does not ship.
pub struct WarehouseMetricStore {
    pool: Pool<Sqlite>,
}

impl WarehouseMetricStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AdSummaryRow {
    ad_id: String,
    provider: String,
    spend: f64,
    impressions: i64,
    clicks: i64,
    conversions: i64,
    revenue: f64,
    roas: f64,
    ctr: f64,
    cpm: f64,
    cpa: Option<f64>,
    daily_budget: Option<f64>,
    first_seen: String,
    last_seen: String,
    days_active: i64,
}

#[derive(Debug, FromRow)]
struct SeriesRow {
    date: String,
    value: f64,
}

fn metric_column(metric: Metric) -> &'static str {
    match metric {
        Metric::Spend => "spend",
        Metric::Roas => "roas",
        Metric::Cpa => "cpa",
        Metric::Ctr => "ctr",
        Metric::Cpm => "cpm",
    }
}

#[async_trait]
impl MetricStoreAdapter for WarehouseMetricStore {
    async fn fetch_ad_summaries(&self, tenant: &str, window_days: u32) -> Result<Vec<AdSummary>> {
        with_retry("fetch_ad_summaries", || async {
            let sql = r#"
                SELECT
                    ad_id,
                    provider,
                    SUM(spend) AS spend,
                    SUM(impressions) AS impressions,
                    SUM(clicks) AS clicks,
                    SUM(conversions) AS conversions,
                    SUM(revenue) AS revenue,
                    SUM(roas * spend) / NULLIF(SUM(spend), 0) AS roas,
                    SUM(ctr * spend) / NULLIF(SUM(spend), 0) AS ctr,
                    SUM(cpm * spend) / NULLIF(SUM(spend), 0) AS cpm,
                    SUM(cpa * spend) / NULLIF(SUM(spend), 0) AS cpa,
                    MAX(daily_budget) AS daily_budget,
                    MIN(date) AS first_seen,
                    MAX(date) AS last_seen,
                    COUNT(DISTINCT date) AS days_active
                FROM ad_daily_metrics
                WHERE tenant = ?1 AND date > date('now', '-' || ?2 || ' days')
                GROUP BY ad_id, provider
                HAVING SUM(spend) > 0
            "#;
            let rows: Vec<AdSummaryRow> = sqlx::query_as(sql)
                .bind(tenant)
                .bind(window_days as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RcaError::UpstreamUnavailable(e.to_string()))?;
            rows.into_iter().map(row_to_summary).collect()
        })
        .await
    }

    async fn fetch_daily_series(
        &self,
        tenant: &str,
        ad_id: &str,
        metric: Metric,
        window_days: u32,
    ) -> Result<Vec<DailyPoint>> {
        let column = metric_column(metric);
        with_retry("fetch_daily_series", || async {
            let sql = format!(
                "SELECT date, {column} AS value FROM ad_daily_metrics \
                 WHERE tenant = ?1 AND ad_id = ?2 AND date > date('now', '-' || ?3 || ' days') \
                 ORDER BY date ASC"
            );
            let rows: Vec<SeriesRow> = sqlx::query_as(&sql)
                .bind(tenant)
                .bind(ad_id)
                .bind(window_days as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RcaError::UpstreamUnavailable(e.to_string()))?;
            rows.into_iter().map(row_to_point).collect()
        })
        .await
    }

    async fn fetch_account_daily_totals(
        &self,
        tenant: &str,
        metric: Metric,
        window_days: u32,
    ) -> Result<Vec<DailyPoint>> {
        let column = metric_column(metric);
        with_retry("fetch_account_daily_totals", || async {
            let sql = format!(
                "SELECT date, SUM({column} * spend) / NULLIF(SUM(spend), 0) AS value \
                 FROM ad_daily_metrics \
                 WHERE tenant = ?1 AND date > date('now', '-' || ?2 || ' days') \
                 GROUP BY date ORDER BY date ASC"
            );
            let rows: Vec<SeriesRow> = sqlx::query_as(&sql)
                .bind(tenant)
                .bind(window_days as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RcaError::UpstreamUnavailable(e.to_string()))?;
            rows.into_iter().map(row_to_point).collect()
        })
        .await
    }

    async fn fetch_recent_activity(
        &self,
        tenant: &str,
        ad_id: &str,
        trailing_days: u32,
    ) -> Result<(u64, u64)> {
        with_retry("fetch_recent_activity", || async {
            let sql = r#"
                SELECT
                    COALESCE(SUM(clicks), 0) AS clicks,
                    COALESCE(SUM(conversions), 0) AS conversions
                FROM ad_daily_metrics
                WHERE tenant = ?1 AND ad_id = ?2
                  AND date > date('now', '-' || ?3 || ' days')
            "#;
            #[derive(Debug, FromRow)]
            struct ActivityRow {
                clicks: i64,
                conversions: i64,
            }
            let row: ActivityRow = sqlx::query_as(sql)
                .bind(tenant)
                .bind(ad_id)
                .bind(trailing_days as i64)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| RcaError::UpstreamUnavailable(e.to_string()))?;
            Ok((row.clicks.max(0) as u64, row.conversions.max(0) as u64))
        })
        .await
    }
}

fn row_to_summary(row: AdSummaryRow) -> Result<AdSummary> {
    let provider = match row.provider.as_str() {
        "google_ads" => crate::domain::Provider::GoogleAds,
        "meta_ads" => crate::domain::Provider::MetaAds,
        "tiktok_ads" => crate::domain::Provider::TikTokAds,
        "amazon_ads" => crate::domain::Provider::AmazonAds,
        _ => crate::domain::Provider::Custom,
    };
    Ok(AdSummary {
        ad_id: row.ad_id,
        provider,
        spend: Decimal::try_from(row.spend).unwrap_or_default(),
        impressions: row.impressions.max(0) as u64,
        clicks: row.clicks.max(0) as u64,
        conversions: row.conversions.max(0) as u64,
        revenue: Decimal::try_from(row.revenue).unwrap_or_default(),
        roas: Decimal::try_from(row.roas).unwrap_or_default(),
        ctr: Decimal::try_from(row.ctr).unwrap_or_default(),
        cpm: Decimal::try_from(row.cpm).unwrap_or_default(),
        cpa: row.cpa.and_then(|v| Decimal::try_from(v).ok()),
        daily_budget: row.daily_budget.and_then(|v| Decimal::try_from(v).ok()),
        first_seen: parse_date(&row.first_seen)?,
        last_seen: parse_date(&row.last_seen)?,
        days_active: row.days_active.max(1) as u32,
    })
}

fn row_to_point(row: SeriesRow) -> Result<DailyPoint> {
    Ok(DailyPoint {
        date: parse_date(&row.date)?,
        value: row.value,
    })
}

fn parse_date(s: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| RcaError::Internal(format!("malformed date '{s}' from warehouse: {e}")))
}
