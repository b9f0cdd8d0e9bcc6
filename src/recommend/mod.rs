//! Turns a per-ad summary (and, when available, a root-cause verdict) into
//! a concrete spend recommendation.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::{Action, AdSummary, Recommendation, RootCauseTag, RootCauseVerdict};

#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub min_days_active: u32,
    /// Below this spend (regardless of ROAS), the guideline table's catch-all
    /// "any / <$1,000 or <7 days" row applies: WAIT.
    pub wait_spend_floor: Decimal,
    /// Minimum spend for the SCALE and MONITOR rows (§4.6 table rows 1-2).
    pub scale_spend_floor: Decimal,
    /// Minimum spend for the REDUCE rows (§4.6 table rows 3-4).
    pub reduce_spend_floor: Decimal,
    /// Minimum spend for the PAUSE row (§4.6 table row 5, ROAS = 0).
    pub pause_spend_floor: Decimal,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            min_days_active: 7,
            wait_spend_floor: Decimal::new(1_000_00, 2),
            scale_spend_floor: Decimal::new(1_000_00, 2),
            reduce_spend_floor: Decimal::new(10_000_00, 2),
            pause_spend_floor: Decimal::new(5_000_00, 2),
        }
    }
}

pub struct RecommendationGenerator {
    config: RecommendationConfig,
}

impl RecommendationGenerator {
    pub fn new(config: RecommendationConfig) -> Self {
        Self { config }
    }

    /// Build a recommendation for one ad. `account_mean_roas` comes from the
    /// account baseline's ROAS statistic (0.0 when unavailable or
    /// insufficient). `verdict` is the RCA diagnosis for this ad, if one was run.
    pub fn generate(
        &self,
        summary: &AdSummary,
        account_mean_roas: f64,
        verdict: Option<&RootCauseVerdict>,
    ) -> Recommendation {
        let (mut action, mut pct_adjustment) = self.classify(summary, account_mean_roas);
        let mut cites_root_cause = None;
        let mut rationale = baseline_rationale(action, summary, account_mean_roas);

        if matches!(action, Action::Monitor | Action::Reduce) {
            if let Some(v) = verdict {
                if v.tag == RootCauseTag::CreativeFatigue {
                    // The one table-external deviation the ontology sanctions
                    // (§4.6): a creative-fatigue diagnosis overrides Monitor/
                    // Reduce with a refresh rather than a budget change.
                    debug!(ad_id = %summary.ad_id, tag = ?v.tag, "deviating from guideline table");
                    action = Action::RefreshCreative;
                    pct_adjustment = 0.0;
                    cites_root_cause = Some(v.tag);
                    rationale = format!(
                        "{} root cause diagnosed with {:?} confidence: {}",
                        v.tag.action_hint(),
                        v.confidence,
                        v.narrative
                    );
                } else if deviation_warrants_citation(v.tag) {
                    // Every other root cause stays within the table's action
                    // (no in-set mapping fits better than what the table
                    // already picked) but still cites the verdict.
                    cites_root_cause = Some(v.tag);
                    rationale = format!(
                        "{} (table action retained); {} root cause diagnosed with {:?} confidence: {}",
                        rationale,
                        v.tag.action_hint(),
                        v.confidence,
                        v.narrative
                    );
                }
            }
        }

        let proposed_new_spend = if action == Action::RefreshCreative {
            summary.spend // a creative refresh doesn't itself change budget
        } else {
            let adjusted = summary.spend.to_f64().unwrap_or(0.0) * (1.0 + pct_adjustment);
            Decimal::try_from(adjusted.max(0.0)).unwrap_or(Decimal::ZERO)
        };

        let expected_revenue_change = (proposed_new_spend - summary.spend) * summary.roas;

        Recommendation {
            ad_id: summary.ad_id.clone(),
            action,
            current_spend: summary.spend,
            proposed_new_spend,
            expected_revenue_change,
            rationale,
            cites_root_cause,
        }
    }

    /// The classification guideline table: ROAS-vs-mean x spend x
    /// days-active, returning an action and the spend adjustment percentage
    /// (e.g. 0.75 for "+75%", -0.5 for "-50%"). Mirrors §4.6's table
    /// row-for-row, including its per-row spend floors.
    fn classify(&self, summary: &AdSummary, account_mean_roas: f64) -> (Action, f64) {
        if summary.days_active < self.config.min_days_active
            || summary.spend < self.config.wait_spend_floor
        {
            return (Action::Wait, 0.0);
        }

        if summary.roas.is_zero() {
            return if summary.spend >= self.config.pause_spend_floor {
                (Action::Pause, -1.0)
            } else {
                // Zero ROAS but not enough spend at risk to justify a full
                // pause; the table has no row for this combination, so hold.
                (Action::Monitor, 0.0)
            };
        }

        if account_mean_roas <= 0.0 {
            return (Action::Monitor, 0.0);
        }

        let roas = summary.roas.to_f64().unwrap_or(0.0);
        let ratio = roas / account_mean_roas;

        if ratio >= 2.0 {
            if summary.spend >= self.config.scale_spend_floor {
                (Action::Scale, 0.75)
            } else {
                (Action::Monitor, 0.0)
            }
        } else if ratio >= 1.0 {
            (Action::Monitor, 0.0)
        } else if summary.spend >= self.config.reduce_spend_floor {
            if ratio >= 0.5 {
                (Action::Reduce, -0.35)
            } else {
                (Action::Reduce, -0.5)
            }
        } else {
            // Below reduce's spend floor: not enough spend at stake yet.
            (Action::Monitor, 0.0)
        }
    }
}

impl Default for RecommendationGenerator {
    fn default() -> Self {
        Self::new(RecommendationConfig::default())
    }
}

/// Tags worth citing in the rationale even though they don't change the
/// action (§9: "the model's only freedom is to select probes and produce
/// prose; mapping probe evidence to a tag is done by code" — and that
/// mapping never invents an action outside the closed six).
fn deviation_warrants_citation(tag: RootCauseTag) -> bool {
    matches!(
        tag,
        RootCauseTag::CpmSpike
            | RootCauseTag::LandingPage
            | RootCauseTag::BudgetExhaustion
            | RootCauseTag::Tracking
    )
}

fn baseline_rationale(action: Action, summary: &AdSummary, account_mean_roas: f64) -> String {
    match action {
        Action::Wait => format!(
            "only {} day(s) active; too new to judge against the account baseline",
            summary.days_active
        ),
        Action::Pause => "zero ROAS at meaningful spend".to_string(),
        Action::Scale => format!(
            "ROAS {} well above account mean {:.2}",
            summary.roas, account_mean_roas
        ),
        Action::Monitor => format!(
            "ROAS {} in line with account mean {:.2}",
            summary.roas, account_mean_roas
        ),
        Action::Reduce => format!(
            "ROAS {} below account mean {:.2}",
            summary.roas, account_mean_roas
        ),
        _ => "deviation from guideline table".to_string(),
    }
}
