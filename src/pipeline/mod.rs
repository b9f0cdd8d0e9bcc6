//! Wires the metric store, baseline engine, anomaly detector, RCA
//! orchestrator, grounded validator, recommendation generator, and execution
//! simulator into the three operations the outer service layer exposes:
//! `analyze`, `recommend`, `execute`.
//!
//! Ordering is strictly sequential within `analyze` (baseline, then
//! detection); diagnosis inside `recommend` fans out per ad up to
//! `rca.concurrency` at a time. Neither stage persists anything beyond the
//! in-memory session.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::agents::{diagnosis_event, execution_event, recommendation_event};
use crate::config::RcaConfig;
use crate::domain::{
    AccountBaseline, AdSummary, Metric, RcaError, Recommendation, Result, RootCauseVerdict,
    Session, SessionId,
};
use crate::engine::{AnomalyDetector, AnomalyDetectorConfig, BaselineEngine};
use crate::execution::{ExecutionResult, ExecutionSimulator, ExecutionState, ExecutionSummary};
use crate::rca::{ModelClient, OrchestratorConfig, RcaOrchestrator, TenantRegistry};
use crate::recommend::{RecommendationConfig, RecommendationGenerator};
use crate::session_store::SessionStore;
use crate::storage::MetricStoreAdapter;
use crate::validation::{GroundedValidator, ProposedVerdict};

const MIN_WINDOW_DAYS: u32 = 1;
const MAX_WINDOW_DAYS: u32 = 365;

/// Response payload for `analyze`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeSummary {
    pub session_id: SessionId,
    pub anomaly_count: usize,
    pub ad_count: usize,
    pub baseline: AccountBaseline,
    pub insufficient_data: bool,
    pub records_dropped: u64,
}

/// Response payload for `recommend`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendSummary {
    pub by_action: HashMap<String, u32>,
    pub total_potential_savings: Decimal,
    pub total_potential_revenue: Decimal,
}

/// The sole entry point the API and CLI surfaces call into. Cloning is
/// cheap: every field is an `Arc` or a handle over one.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn MetricStoreAdapter>,
    sessions: SessionStore,
    model_client: Arc<dyn ModelClient>,
    config: RcaConfig,
    tenant_registry: TenantRegistry,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn MetricStoreAdapter>,
        model_client: Arc<dyn ModelClient>,
        config: RcaConfig,
        tenant_registry: TenantRegistry,
    ) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
            model_client,
            config,
            tenant_registry,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// `analyze(tenant, windowDays) -> (sessionId, summary)`.
    ///
    /// Fetches ad summaries, computes the account baseline, runs anomaly
    /// detection, and stores the result as a new session. Bounded by a
    /// 120-second wall-clock deadline covering the whole operation.
    #[instrument(skip(self))]
    pub async fn analyze(&self, tenant: &str, window_days: u32) -> Result<(SessionId, AnalyzeSummary)> {
        timeout(
            std::time::Duration::from_secs(120),
            self.analyze_inner(tenant, window_days),
        )
        .await
        .map_err(|_| RcaError::Timeout(format!("analyze exceeded its deadline for tenant {tenant}")))?
    }

    async fn analyze_inner(&self, tenant: &str, window_days: u32) -> Result<(SessionId, AnalyzeSummary)> {
        if !(MIN_WINDOW_DAYS..=MAX_WINDOW_DAYS).contains(&window_days) {
            return Err(RcaError::WindowOutOfRange(format!(
                "window_days must be between {MIN_WINDOW_DAYS} and {MAX_WINDOW_DAYS}, got {window_days}"
            )));
        }
        self.tenant_registry.resolve(tenant)?;

        let summaries = self.store.fetch_ad_summaries(tenant, window_days).await?;

        // Baseline, then detection: strictly sequential, each step consuming
        // the prior step's output.
        let baseline_engine = BaselineEngine::new(self.config.anomaly.min_sample_size);
        let baseline = baseline_engine.compute(&summaries);
        let insufficient_data = Metric::ALL.iter().all(|m| !baseline.is_sufficient(*m));

        let anomalies = if insufficient_data {
            Vec::new()
        } else {
            let detector = AnomalyDetector::new(AnomalyDetectorConfig {
                threshold_sigma: self.config.anomaly.threshold_sigma,
                min_spend: Decimal::try_from(self.config.anomaly.min_spend).unwrap_or(Decimal::ZERO),
                ..AnomalyDetectorConfig::default()
            });
            let mut found = detector.detect(&summaries, &baseline);
            // Final stable key: descending |z|, then ad identifier.
            found.sort_by(|a, b| {
                b.z_score
                    .abs()
                    .partial_cmp(&a.z_score.abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.ad_id.cmp(&b.ad_id))
            });
            found
        };

        let mut session = Session::new(tenant, window_days, self.config.session.ttl_seconds);
        session.summaries = summaries;
        session.baseline = baseline.clone();
        session.anomalies = anomalies;
        session.insufficient_data = insufficient_data;
        session.records_dropped = self.store.dropped_record_count();

        let summary = AnalyzeSummary {
            session_id: session.id,
            anomaly_count: session.anomalies.len(),
            ad_count: session.summaries.len(),
            baseline,
            insufficient_data,
            records_dropped: session.records_dropped,
        };

        let id = self.sessions.insert(session).await;
        info!(
            tenant,
            window_days,
            anomalies = summary.anomaly_count,
            ads = summary.ad_count,
            insufficient_data,
            "analysis complete"
        );
        Ok((id, summary))
    }

    /// `recommend(sessionId, useModelReasoning) -> (list of Recommendation, summary)`.
    ///
    /// Diagnoses the session's actionable anomalies (one diagnosis per ad,
    /// bounded by `rca.concurrency` in flight) when `use_model_reasoning` is
    /// set, then generates a recommendation for every ad the session knows
    /// about.
    #[instrument(skip(self))]
    pub async fn recommend(
        &self,
        session_id: SessionId,
        use_model_reasoning: bool,
    ) -> Result<(Vec<Recommendation>, RecommendSummary)> {
        let session = self.sessions.get(session_id).await?;

        let verdicts = if use_model_reasoning {
            self.diagnose_anomalies(&session).await?
        } else {
            HashMap::new()
        };

        let generator = RecommendationGenerator::new(RecommendationConfig::default());
        let account_mean_roas = session
            .baseline
            .get(Metric::Roas)
            .map(|m| m.mean)
            .unwrap_or(0.0);

        let mut recommendations: Vec<Recommendation> = session
            .summaries
            .iter()
            .map(|s| {
                let verdict = verdicts.get(&s.ad_id);
                let rec = generator.generate(s, account_mean_roas, verdict);
                for v in GroundedValidator::validate_recommendation(&rec, s, s.roas) {
                    warn!(ad_id = %rec.ad_id, check = ?v.check, message = %v.message, "recommendation failed grounding check");
                }
                rec
            })
            .collect();
        recommendations.sort_by(|a, b| a.ad_id.cmp(&b.ad_id));

        let summary = summarize_recommendations(&recommendations);

        let events: Vec<_> = recommendations
            .iter()
            .map(|r| {
                serde_json::to_value(recommendation_event(r, &session.tenant))
                    .unwrap_or(serde_json::Value::Null)
            })
            .collect();
        let diagnosis_events: Vec<_> = verdicts
            .values()
            .map(|v| {
                serde_json::to_value(diagnosis_event(v, self.config.rca.max_steps, &session.tenant))
                    .unwrap_or(serde_json::Value::Null)
            })
            .collect();

        self.sessions
            .with_mut(session_id, |s| {
                s.verdicts = verdicts;
                s.recommendations = recommendations.clone();
                s.decision_log.extend(diagnosis_events);
                s.decision_log.extend(events);
            })
            .await?;

        info!(
            session_id = %session_id,
            recommendations = recommendations.len(),
            use_model_reasoning,
            "recommendations generated"
        );
        Ok((recommendations, summary))
    }

    /// `execute(sessionId, approvedAdIds?, dryRun) -> (list of ExecutionResult, summary)`.
    ///
    /// Recommendations for an ad identifier that no longer appears in the
    /// session's known ad set fail outright rather than being attempted;
    /// everything else runs through the dry-run simulator.
    #[instrument(skip(self))]
    pub async fn execute(
        &self,
        session_id: SessionId,
        approved_ad_ids: Option<HashSet<String>>,
        dry_run: bool,
    ) -> Result<(Vec<ExecutionResult>, ExecutionSummary)> {
        let session = self.sessions.get(session_id).await?;
        let known_ad_ids: HashSet<&str> = session.summaries.iter().map(|s| s.ad_id.as_str()).collect();

        let mut runnable = Vec::with_capacity(session.recommendations.len());
        let mut stale_results = Vec::new();
        for rec in &session.recommendations {
            if known_ad_ids.contains(rec.ad_id.as_str()) {
                runnable.push(rec.clone());
            } else {
                stale_results.push(ExecutionResult {
                    ad_id: rec.ad_id.clone(),
                    state: ExecutionState::Failed,
                    detail: "ad identifier no longer present in this session".to_string(),
                });
            }
        }

        let (mut results, mut summary) =
            ExecutionSimulator::execute(&runnable, approved_ad_ids.as_ref(), dry_run);
        summary.failed += stale_results.len() as u32;
        results.append(&mut stale_results);

        let event = execution_event(&summary, &session_id.to_string(), &session.tenant);
        self.sessions
            .with_mut(session_id, |s| {
                s.decision_log
                    .push(serde_json::to_value(event).unwrap_or(serde_json::Value::Null));
            })
            .await?;

        info!(
            session_id = %session_id,
            success = summary.success,
            failed = summary.failed,
            skipped = summary.skipped,
            dry_run,
            "execution simulated"
        );
        Ok((results, summary))
    }

    /// Diagnoses each distinct actionable ad's anomalies concurrently, bounded
    /// by `rca.concurrency`. An ad whose diagnosis errors or times out simply
    /// proceeds without a verdict; `recommend` still produces a baseline
    /// recommendation for it.
    async fn diagnose_anomalies(&self, session: &Session) -> Result<HashMap<String, RootCauseVerdict>> {
        let orchestrator = Arc::new(RcaOrchestrator::new(
            self.model_client.clone(),
            OrchestratorConfig {
                max_steps: self.config.rca.max_steps,
                ..OrchestratorConfig::default()
            },
        ));
        let semaphore = Arc::new(Semaphore::new(self.config.rca.concurrency.max(1)));
        let summaries_by_id: HashMap<&str, &AdSummary> =
            session.summaries.iter().map(|s| (s.ad_id.as_str(), s)).collect();

        let mut seen = HashSet::new();
        let mut tasks = FuturesUnordered::new();
        for anomaly in &session.anomalies {
            if !anomaly.is_actionable() || !seen.insert(anomaly.ad_id.clone()) {
                continue;
            }
            let Some(summary) = summaries_by_id.get(anomaly.ad_id.as_str()).copied().cloned() else {
                continue;
            };

            let orchestrator = orchestrator.clone();
            let semaphore = semaphore.clone();
            let store = self.store.clone();
            let baseline = session.baseline.clone();
            let tenant = session.tenant.clone();
            let window_days = session.window_days;
            let anomaly = anomaly.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("diagnosis semaphore closed early");
                let ad_id = summary.ad_id.clone();
                let verdict = orchestrator
                    .diagnose(store.as_ref(), &tenant, &summary, &baseline, &anomaly, window_days)
                    .await;
                (ad_id, verdict)
            }));
        }

        let mut verdicts = HashMap::new();
        while let Some(joined) = tasks.next().await {
            let (ad_id, outcome) = joined
                .map_err(|e| RcaError::Internal(format!("diagnosis task did not complete: {e}")))?;
            match outcome {
                Ok(verdict) => {
                    check_verdict_grounding(&verdict);
                    verdicts.insert(ad_id, verdict);
                }
                Err(e) => {
                    warn!(ad_id, error = %e, "diagnosis failed; proceeding without a verdict");
                }
            }
        }
        Ok(verdicts)
    }
}

/// The orchestrator always resolves its own tag deterministically from the
/// evidence chain, so this never finds a mismatch in practice; it exists so a
/// future model-proposed tag (should the orchestrator ever expose one) is
/// still checked before acceptance, per the grounded-output contract.
fn check_verdict_grounding(verdict: &RootCauseVerdict) {
    let proposed = ProposedVerdict {
        tag: verdict.tag,
        cited_probes: verdict.evidence_chain.iter().map(|e| e.probe).collect(),
        narrative: verdict.narrative.clone(),
    };
    for v in GroundedValidator::validate_verdict(&proposed, &verdict.evidence_chain) {
        warn!(ad_id = %verdict.ad_id, check = ?v.check, message = %v.message, "verdict failed grounding check");
    }
}

fn summarize_recommendations(recommendations: &[Recommendation]) -> RecommendSummary {
    let mut summary = RecommendSummary::default();
    for rec in recommendations {
        *summary
            .by_action
            .entry(format!("{:?}", rec.action))
            .or_insert(0) += 1;
        if rec.proposed_new_spend < rec.current_spend {
            summary.total_potential_savings += rec.current_spend - rec.proposed_new_spend;
        }
        if rec.expected_revenue_change > Decimal::ZERO {
            summary.total_potential_revenue += rec.expected_revenue_change;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdRecord, Provider};
    use crate::rca::{DeterministicModelClient, TenantEntry};
    use crate::storage::InMemoryMetricStore;
    use rust_decimal_macros::dec;

    fn acme_registry() -> TenantRegistry {
        TenantRegistry::from_entries(vec![TenantEntry {
            short_code: "acme".into(),
            warehouse_view_id: "view_acme".into(),
        }])
    }

    fn seed_records(ad_id: &str, spend: Decimal, roas: Decimal, days: u32) -> Vec<AdRecord> {
        let today = chrono::Utc::now().date_naive();
        (0..days)
            .map(|i| AdRecord {
                ad_id: ad_id.into(),
                tenant: "acme".into(),
                provider: Provider::GoogleAds,
                date: today - chrono::Duration::days((days - 1 - i) as i64),
                spend,
                impressions: 10_000,
                clicks: 100,
                conversions: 10,
                revenue: spend * roas,
                roas,
                ctr: dec!(0.01),
                cpm: dec!(5.0),
                cpa: Some(dec!(10.0)),
                daily_budget: Some(dec!(500.0)),
            })
            .collect()
    }

    fn test_pipeline() -> (Pipeline, Arc<InMemoryMetricStore>) {
        let store = Arc::new(InMemoryMetricStore::new());
        let mut records = Vec::new();
        for i in 0..11 {
            records.extend(seed_records(
                &format!("normal{i}"),
                dec!(200.0),
                dec!(6.88),
                30,
            ));
        }
        records.extend(seed_records("zero", dec!(88000.0), dec!(0.0), 30));
        store.seed("acme", records);

        let config = RcaConfig::default();
        let pipeline = Pipeline::new(
            store.clone(),
            Arc::new(DeterministicModelClient),
            config,
            acme_registry(),
        );
        (pipeline, store)
    }

    #[tokio::test]
    async fn analyze_rejects_unknown_tenant() {
        let (pipeline, _store) = test_pipeline();
        let err = pipeline.analyze("ghost-corp", 30).await.unwrap_err();
        assert!(matches!(err, RcaError::UnknownTenant(_)));
    }

    #[tokio::test]
    async fn analyze_rejects_out_of_range_window() {
        let (pipeline, _store) = test_pipeline();
        let err = pipeline.analyze("acme", 0).await.unwrap_err();
        assert!(matches!(err, RcaError::WindowOutOfRange(_)));
    }

    #[tokio::test]
    async fn full_lifecycle_flags_zero_roas_and_pauses_it() {
        let (pipeline, _store) = test_pipeline();
        let (session_id, analyze_summary) = pipeline.analyze("acme", 30).await.unwrap();
        assert_eq!(analyze_summary.ad_count, 12);
        assert!(analyze_summary.anomaly_count >= 1);
        assert!(!analyze_summary.insufficient_data);

        let (recommendations, recommend_summary) =
            pipeline.recommend(session_id, true).await.unwrap();
        assert_eq!(recommendations.len(), 12);
        let zero = recommendations.iter().find(|r| r.ad_id == "zero").unwrap();
        assert_eq!(zero.action, crate::domain::Action::Pause);
        assert!(recommend_summary.total_potential_savings > Decimal::ZERO);

        let (results, execution_summary) = pipeline.execute(session_id, None, true).await.unwrap();
        assert_eq!(results.len(), 12);
        assert_eq!(execution_summary.failed, 0);
        assert!(execution_summary.dry_run);
    }

    #[tokio::test]
    async fn execute_fails_recommendations_for_unknown_ad_ids() {
        let (pipeline, _store) = test_pipeline();
        let (session_id, _) = pipeline.analyze("acme", 30).await.unwrap();
        pipeline.recommend(session_id, false).await.unwrap();

        pipeline
            .sessions()
            .with_mut(session_id, |s| {
                s.recommendations.push(Recommendation {
                    ad_id: "ghost".into(),
                    action: crate::domain::Action::Monitor,
                    current_spend: dec!(100.0),
                    proposed_new_spend: dec!(100.0),
                    expected_revenue_change: Decimal::ZERO,
                    rationale: "stale".into(),
                    cites_root_cause: None,
                });
            })
            .await
            .unwrap();

        let (results, summary) = pipeline.execute(session_id, None, true).await.unwrap();
        assert_eq!(summary.failed, 1);
        assert!(results
            .iter()
            .any(|r| r.ad_id == "ghost" && r.state == ExecutionState::Failed));
    }
}
