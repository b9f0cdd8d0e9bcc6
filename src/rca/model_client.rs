use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{AccountBaseline, AdSummary, Anomaly, Evidence, Metric, ProbeKind, Result};

use super::catalog::ProbeCatalogEntry;

/// Everything the model sees before choosing its next move. All fields are
/// snapshots of facts already computed by deterministic code; the model
/// never receives raw records, only these grounded aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelContext {
    pub ad_id: String,
    pub summary: AdSummary,
    pub baseline: AccountBaseline,
    pub anomaly: Anomaly,
    pub evidence_so_far: Vec<Evidence>,
    pub probe_catalog: Vec<ProbeCatalogEntry>,
    pub step: u32,
    pub max_steps: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ModelDecision {
    SelectProbe { probe: ProbeKind },
    Conclude { narrative: String },
}

/// Drives the model side of the RCA tool loop. The model only ever picks a
/// probe or declares it is done; it never writes the final tag.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn select_next_probe(&self, ctx: &ModelContext) -> Result<ModelDecision>;
}

/// §4.5 step 2's decision-table hint: for each anomaly metric, the probe
/// order a sensible diagnostician would try first. Probes outside the
/// preference list are appended afterward in catalog order, so every probe
/// remains reachable even when its metric isn't named here.
fn probe_preference(metric: Metric) -> &'static [ProbeKind] {
    match metric {
        Metric::Roas => &[ProbeKind::CpmSpike, ProbeKind::CreativeFatigue, ProbeKind::Tracking],
        Metric::Cpa => &[ProbeKind::LandingPage, ProbeKind::CpmSpike, ProbeKind::Tracking],
        Metric::Cpm => &[ProbeKind::CpmSpike, ProbeKind::Seasonality],
        Metric::Ctr => &[ProbeKind::CreativeFatigue, ProbeKind::LandingPage],
        Metric::Spend => &[ProbeKind::BudgetExhaustion, ProbeKind::Seasonality],
    }
}

/// Rule-based fallback used when no external model is configured and as the
/// validator's last resort after retries are exhausted: walks the probe
/// catalog in the decision-table preference order for the anomaly's metric,
/// then any remaining probes in catalog order, skipping probes already run.
pub struct DeterministicModelClient;

#[async_trait]
impl ModelClient for DeterministicModelClient {
    async fn select_next_probe(&self, ctx: &ModelContext) -> Result<ModelDecision> {
        let already_run: std::collections::HashSet<ProbeKind> =
            ctx.evidence_so_far.iter().map(|e| e.probe).collect();

        let preferred = probe_preference(ctx.anomaly.metric);
        let ordered = preferred.iter().copied().chain(
            ProbeKind::ALL
                .into_iter()
                .filter(|k| !preferred.contains(k)),
        );

        for kind in ordered {
            if !already_run.contains(&kind) {
                return Ok(ModelDecision::SelectProbe { probe: kind });
            }
        }
        Ok(ModelDecision::Conclude {
            narrative: "exhausted probe catalog".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AccountBaseline, Polarity, Severity};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn ctx_for(metric: Metric) -> ModelContext {
        ModelContext {
            ad_id: "a1".into(),
            summary: crate::domain::AdSummary {
                ad_id: "a1".into(),
                provider: crate::domain::Provider::GoogleAds,
                spend: dec!(1000.0),
                impressions: 10000,
                clicks: 100,
                conversions: 10,
                revenue: dec!(3000.0),
                roas: dec!(3.0),
                ctr: dec!(0.01),
                cpm: dec!(5.0),
                cpa: Some(dec!(100.0)),
                daily_budget: Some(dec!(50.0)),
                first_seen: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                last_seen: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
                days_active: 10,
            },
            baseline: AccountBaseline::default(),
            anomaly: Anomaly {
                ad_id: "a1".into(),
                metric,
                value: dec!(0.0),
                spend: dec!(1000.0),
                z_score: -2.5,
                severity: Severity::Significant,
                polarity: Polarity::Bad,
            },
            evidence_so_far: Vec::new(),
            probe_catalog: Vec::new(),
            step: 0,
            max_steps: 6,
        }
    }

    #[tokio::test]
    async fn roas_anomaly_prefers_cpm_spike_first() {
        let client = DeterministicModelClient;
        let decision = client.select_next_probe(&ctx_for(Metric::Roas)).await.unwrap();
        assert_eq!(decision, ModelDecision::SelectProbe { probe: ProbeKind::CpmSpike });
    }

    #[tokio::test]
    async fn cpa_anomaly_prefers_landing_page_first() {
        let client = DeterministicModelClient;
        let decision = client.select_next_probe(&ctx_for(Metric::Cpa)).await.unwrap();
        assert_eq!(
            decision,
            ModelDecision::SelectProbe { probe: ProbeKind::LandingPage }
        );
    }
}
