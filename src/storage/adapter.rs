use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::{AdSummary, Metric, RcaError, Result};
use crate::probes::DailyPoint;

/// Backoff schedule used by `with_retry`: 100ms, 400ms, 1600ms.
pub const RETRY_BACKOFF_MS: [u64; 3] = [100, 400, 1600];

/// Reads ad performance data. Implementations may hit a warehouse, an
/// in-memory fixture (tests), or any other source of truth; callers never
/// see anything below this trait.
#[async_trait]
pub trait MetricStoreAdapter: Send + Sync {
    async fn fetch_ad_summaries(&self, tenant: &str, window_days: u32) -> Result<Vec<AdSummary>>;

    async fn fetch_daily_series(
        &self,
        tenant: &str,
        ad_id: &str,
        metric: Metric,
        window_days: u32,
    ) -> Result<Vec<DailyPoint>>;

    async fn fetch_account_daily_totals(
        &self,
        tenant: &str,
        metric: Metric,
        window_days: u32,
    ) -> Result<Vec<DailyPoint>>;

    /// Sums raw clicks and conversions over the trailing `trailing_days` for
    /// one ad, used by the tracking probe to isolate its "trailing 48-hour
    /// window" from the ad's longer history. Distinct from the five ratio
    /// metrics: clicks/conversions are whole-number counts, never averaged.
    async fn fetch_recent_activity(
        &self,
        tenant: &str,
        ad_id: &str,
        trailing_days: u32,
    ) -> Result<(u64, u64)>;

    /// Count of raw rows dropped at the parse boundary (§9 Open Question 1)
    /// since this adapter was created. Adapters whose schema is already
    /// strongly typed (no string-to-number parse step) report zero.
    fn dropped_record_count(&self) -> u64 {
        0
    }
}

/// Retries a fallible warehouse call up to 3 times with the fixed backoff
/// schedule {100ms, 400ms, 1600ms}. A failure that survives every attempt is
/// always surfaced as `UpstreamUnavailable`, regardless of the underlying error.
pub async fn with_retry<F, Fut, T>(op_name: &str, mut f: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_err: Option<RcaError> = None;
    for (attempt, delay_ms) in RETRY_BACKOFF_MS.iter().enumerate() {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                warn!(op = op_name, attempt = attempt + 1, error = %e, "metric store call failed");
                last_err = Some(e);
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
            }
        }
    }
    match f().await {
        Ok(v) => Ok(v),
        Err(e) => {
            let cause = last_err.unwrap_or(e);
            Err(RcaError::UpstreamUnavailable(format!(
                "{op_name} failed after {} attempts: {cause}",
                RETRY_BACKOFF_MS.len() + 1
            )))
        }
    }
}
