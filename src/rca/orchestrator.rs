use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::{info, warn};

use crate::domain::{
    AccountBaseline, AdSummary, Anomaly, Evidence, Metric, ProbeKind, Result, RootCauseVerdict,
};
use crate::probes::{run_probe, DailyPoint, ProbeInputs};
use crate::storage::MetricStoreAdapter;

use super::catalog::ProbeCatalog;
use super::model_client::{ModelClient, ModelContext, ModelDecision};
use super::resolver::{resolve_confidence, resolve_tag};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_steps: u32,
    pub probe_timeout: Duration,
    pub model_call_timeout: Duration,
    pub per_anomaly_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_steps: 6,
            probe_timeout: Duration::from_secs(10),
            model_call_timeout: Duration::from_secs(30),
            per_anomaly_timeout: Duration::from_secs(60),
        }
    }
}

pub struct RcaOrchestrator {
    model_client: Arc<dyn ModelClient>,
    config: OrchestratorConfig,
}

impl RcaOrchestrator {
    pub fn new(model_client: Arc<dyn ModelClient>, config: OrchestratorConfig) -> Self {
        Self { model_client, config }
    }

    /// Diagnose a single anomaly: repeatedly ask the model to pick a probe,
    /// run it, and feed the evidence back, bounded by both a step count and
    /// a wall-clock deadline. The winning tag is always resolved by code.
    pub async fn diagnose(
        &self,
        store: &dyn MetricStoreAdapter,
        tenant: &str,
        summary: &AdSummary,
        baseline: &AccountBaseline,
        anomaly: &Anomaly,
        window_days: u32,
    ) -> Result<RootCauseVerdict> {
        let deadline = Instant::now() + self.config.per_anomaly_timeout;
        let mut evidence_chain: Vec<Evidence> = Vec::new();
        let mut step = 0u32;
        let mut timed_out = false;

        loop {
            if step >= self.config.max_steps {
                break;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                timed_out = true;
                break;
            }

            let ctx = ModelContext {
                ad_id: summary.ad_id.clone(),
                summary: summary.clone(),
                baseline: baseline.clone(),
                anomaly: anomaly.clone(),
                evidence_so_far: evidence_chain.clone(),
                probe_catalog: ProbeCatalog::entries(),
                step,
                max_steps: self.config.max_steps,
            };

            let decision = match timeout(
                remaining.min(self.config.model_call_timeout),
                self.model_client.select_next_probe(&ctx),
            )
            .await
            {
                Ok(Ok(d)) => d,
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    timed_out = true;
                    break;
                }
            };

            match decision {
                ModelDecision::Conclude { narrative } => {
                    info!(ad_id = %summary.ad_id, %narrative, "model concluded RCA");
                    break;
                }
                ModelDecision::SelectProbe { probe } => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        timed_out = true;
                        break;
                    }
                    let inputs = gather_inputs(store, tenant, summary, probe, window_days).await?;
                    let probe_fut = async { run_probe(probe, &inputs) };
                    match timeout(remaining.min(self.config.probe_timeout), probe_fut).await {
                        Ok(evidence) => evidence_chain.push(evidence),
                        Err(_) => {
                            warn!(ad_id = %summary.ad_id, probe = ?probe, "probe timed out");
                            timed_out = true;
                            break;
                        }
                    }
                    step += 1;
                }
            }
        }

        let tag = if timed_out && evidence_chain.is_empty() {
            crate::domain::RootCauseTag::Unknown
        } else {
            resolve_tag(&evidence_chain)
        };
        let confidence = if timed_out && evidence_chain.is_empty() {
            crate::domain::Confidence::Low
        } else {
            resolve_confidence(tag, &evidence_chain)
        };

        let narrative = if timed_out {
            format!(
                "diagnosis hit its deadline after {step} step(s); resolving from partial evidence"
            )
        } else {
            format!("resolved {tag:?} from {} probe(s)", evidence_chain.len())
        };

        Ok(RootCauseVerdict {
            ad_id: summary.ad_id.clone(),
            tag,
            confidence,
            evidence_chain,
            narrative,
            steps_used: step,
        })
    }
}

/// Fetches exactly the series a given probe needs. Probes receive pre-fetched
/// data and never call the metric store themselves.
async fn gather_inputs(
    store: &dyn MetricStoreAdapter,
    tenant: &str,
    summary: &AdSummary,
    probe: ProbeKind,
    window_days: u32,
) -> Result<ProbeInputs> {
    let ad_id = &summary.ad_id;
    let mut inputs = ProbeInputs {
        clicks: summary.clicks,
        conversions: summary.conversions,
        ..Default::default()
    };

    match probe {
        ProbeKind::CpmSpike => {
            inputs.cpm_series = Some(
                store
                    .fetch_daily_series(tenant, ad_id, Metric::Cpm, window_days)
                    .await?,
            );
        }
        ProbeKind::CreativeFatigue => {
            inputs.ctr_series = Some(
                store
                    .fetch_daily_series(tenant, ad_id, Metric::Ctr, window_days)
                    .await?,
            );
            inputs.impressions_series = Some(impressions_series(store, tenant, ad_id, window_days).await?);
        }
        ProbeKind::LandingPage => {
            inputs.ctr_series = Some(
                store
                    .fetch_daily_series(tenant, ad_id, Metric::Ctr, window_days)
                    .await?,
            );
            inputs.cvr_series = Some(cvr_series(store, tenant, ad_id, window_days).await?);
        }
        ProbeKind::Tracking => {
            // Trailing 48h clicks/conversions, isolated from the rest of the
            // window so "historical conversion rate" and "current" are never
            // the same number: a tracking break shows up as a trailing window
            // with zero conversions against a window-to-date rate that was
            // positive before it.
            let (recent_clicks, recent_conversions) =
                store.fetch_recent_activity(tenant, ad_id, 2).await?;
            let prior_clicks = summary.clicks.saturating_sub(recent_clicks);
            let prior_conversions = summary.conversions.saturating_sub(recent_conversions);
            inputs.clicks = recent_clicks;
            inputs.conversions = recent_conversions;
            inputs.historical_conversion_rate = if prior_clicks > 0 {
                Some(prior_conversions as f64 / prior_clicks as f64)
            } else {
                None
            };
        }
        ProbeKind::BudgetExhaustion => {
            inputs.spend_series = Some(
                store
                    .fetch_daily_series(tenant, ad_id, Metric::Spend, window_days)
                    .await?,
            );
            inputs.daily_budget = summary.daily_budget.and_then(|d| {
                use rust_decimal::prelude::ToPrimitive;
                d.to_f64()
            });
        }
        ProbeKind::Seasonality => {
            inputs.seasonal_metric_series = Some(
                store
                    .fetch_daily_series(tenant, ad_id, Metric::Roas, 365)
                    .await?,
            );
        }
    }

    Ok(inputs)
}

/// Impressions are not one of the five tracked baseline metrics, so spend
/// (which moves with delivery volume) stands in as the stability signal.
async fn impressions_series(
    store: &dyn MetricStoreAdapter,
    tenant: &str,
    ad_id: &str,
    window_days: u32,
) -> Result<Vec<DailyPoint>> {
    store
        .fetch_daily_series(tenant, ad_id, Metric::Spend, window_days)
        .await
}

/// CVR is not separately tracked; ROAS moves with conversion rate closely
/// enough to stand in for the landing-page probe's drop check.
async fn cvr_series(
    store: &dyn MetricStoreAdapter,
    tenant: &str,
    ad_id: &str,
    window_days: u32,
) -> Result<Vec<DailyPoint>> {
    store
        .fetch_daily_series(tenant, ad_id, Metric::Roas, window_days)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Polarity, Provider, RootCauseTag, Severity};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::storage::InMemoryMetricStore;

    fn ad_summary(ad_id: &str) -> AdSummary {
        crate::domain::AdSummary {
            ad_id: ad_id.into(),
            provider: Provider::GoogleAds,
            spend: dec!(1000.0),
            impressions: 10_000,
            clicks: 100,
            conversions: 0,
            revenue: dec!(0.0),
            roas: dec!(0.0),
            ctr: dec!(0.01),
            cpm: dec!(5.0),
            cpa: None,
            daily_budget: Some(dec!(50.0)),
            first_seen: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            last_seen: NaiveDate::from_ymd_opt(2026, 1, 30).unwrap(),
            days_active: 30,
        }
    }

    fn roas_anomaly(ad_id: &str) -> Anomaly {
        Anomaly {
            ad_id: ad_id.into(),
            metric: Metric::Roas,
            value: dec!(0.0),
            spend: dec!(1000.0),
            z_score: -3.4,
            severity: Severity::Extreme,
            polarity: Polarity::Bad,
        }
    }

    /// A model client that always selects the same probe, forever, never
    /// concluding. Exercises the hard step cap independent of any deadline.
    struct NeverConcludes;

    #[async_trait]
    impl ModelClient for NeverConcludes {
        async fn select_next_probe(&self, _ctx: &ModelContext) -> Result<ModelDecision> {
            Ok(ModelDecision::SelectProbe { probe: ProbeKind::Seasonality })
        }
    }

    /// Concludes immediately without running any probe.
    struct ConcludesImmediately;

    #[async_trait]
    impl ModelClient for ConcludesImmediately {
        async fn select_next_probe(&self, _ctx: &ModelContext) -> Result<ModelDecision> {
            Ok(ModelDecision::Conclude { narrative: "nothing to check".into() })
        }
    }

    /// Selects Tracking once, then concludes. Counts its own invocations so
    /// the test can assert the loop actually stops calling it.
    #[derive(Default)]
    struct SelectTrackingThenConclude {
        calls: AtomicU32,
    }

    #[async_trait]
    impl ModelClient for SelectTrackingThenConclude {
        async fn select_next_probe(&self, ctx: &ModelContext) -> Result<ModelDecision> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ctx.evidence_so_far.is_empty() {
                Ok(ModelDecision::SelectProbe { probe: ProbeKind::Tracking })
            } else {
                Ok(ModelDecision::Conclude { narrative: "done".into() })
            }
        }
    }

    #[tokio::test]
    async fn step_cap_bounds_the_loop_when_model_never_concludes() {
        let store = InMemoryMetricStore::new();
        let orchestrator = RcaOrchestrator::new(
            Arc::new(NeverConcludes),
            OrchestratorConfig { max_steps: 3, ..OrchestratorConfig::default() },
        );
        let summary = ad_summary("a1");
        let anomaly = roas_anomaly("a1");
        let verdict = orchestrator
            .diagnose(&store, "acme", &summary, &AccountBaseline::default(), &anomaly, 30)
            .await
            .unwrap();
        assert_eq!(verdict.steps_used, 3);
    }

    #[tokio::test]
    async fn concluding_immediately_yields_unknown_with_no_evidence() {
        let store = InMemoryMetricStore::new();
        let orchestrator =
            RcaOrchestrator::new(Arc::new(ConcludesImmediately), OrchestratorConfig::default());
        let summary = ad_summary("a1");
        let anomaly = roas_anomaly("a1");
        let verdict = orchestrator
            .diagnose(&store, "acme", &summary, &AccountBaseline::default(), &anomaly, 30)
            .await
            .unwrap();
        assert_eq!(verdict.tag, RootCauseTag::Unknown);
        assert_eq!(verdict.steps_used, 0);
        assert!(verdict.evidence_chain.is_empty());
    }

    /// Seeds 28 days of healthy conversions followed by 2 days with clicks
    /// but none landing, so the tracking probe's trailing-window/history
    /// split actually has something to split.
    fn seed_tracking_break(store: &InMemoryMetricStore, ad_id: &str) -> AdSummary {
        use crate::domain::AdRecord;
        let today = chrono::Utc::now().date_naive();
        let mut records = Vec::new();
        for i in 0..28 {
            records.push(AdRecord {
                ad_id: ad_id.into(),
                tenant: "acme".into(),
                provider: Provider::GoogleAds,
                date: today - chrono::Duration::days((29 - i) as i64),
                spend: dec!(100.0),
                impressions: 1000,
                clicks: 10,
                conversions: 1,
                revenue: dec!(300.0),
                roas: dec!(3.0),
                ctr: dec!(0.01),
                cpm: dec!(5.0),
                cpa: Some(dec!(100.0)),
                daily_budget: Some(dec!(50.0)),
            });
        }
        for i in 0..2 {
            records.push(AdRecord {
                ad_id: ad_id.into(),
                tenant: "acme".into(),
                provider: Provider::GoogleAds,
                date: today - chrono::Duration::days((1 - i) as i64),
                spend: dec!(500.0),
                impressions: 5000,
                clicks: 50,
                conversions: 0,
                revenue: dec!(0.0),
                roas: dec!(0.0),
                ctr: dec!(0.01),
                cpm: dec!(5.0),
                cpa: None,
                daily_budget: Some(dec!(50.0)),
            });
        }
        store.seed("acme", records.clone());
        AdSummary::from_records(ad_id, &records)
    }

    #[tokio::test]
    async fn stops_calling_model_once_it_concludes() {
        let store = InMemoryMetricStore::new();
        let summary = seed_tracking_break(&store, "a1");
        let client = Arc::new(SelectTrackingThenConclude::default());
        let orchestrator = RcaOrchestrator::new(client.clone(), OrchestratorConfig::default());
        let anomaly = roas_anomaly("a1");
        let verdict = orchestrator
            .diagnose(&store, "acme", &summary, &AccountBaseline::default(), &anomaly, 30)
            .await
            .unwrap();
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
        assert_eq!(verdict.steps_used, 1);
        assert_eq!(verdict.tag, RootCauseTag::Tracking);
        assert_eq!(verdict.confidence, crate::domain::Confidence::High);
    }

    #[tokio::test]
    async fn per_anomaly_deadline_terminates_with_partial_evidence() {
        let store = InMemoryMetricStore::new();
        let orchestrator = RcaOrchestrator::new(
            Arc::new(NeverConcludes),
            OrchestratorConfig {
                max_steps: 100,
                per_anomaly_timeout: Duration::from_millis(1),
                probe_timeout: Duration::from_millis(1),
                model_call_timeout: Duration::from_millis(1),
            },
        );
        let summary = ad_summary("a1");
        let anomaly = roas_anomaly("a1");
        let verdict = orchestrator
            .diagnose(&store, "acme", &summary, &AccountBaseline::default(), &anomaly, 30)
            .await
            .unwrap();
        assert!(verdict.steps_used < 100);
        assert!(verdict.narrative.contains("deadline"));
    }
}
