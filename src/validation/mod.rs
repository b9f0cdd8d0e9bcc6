//! Grounded output validator.
//!
//! Any prose or judgment an external model produces is checked against the
//! facts that were actually computed before it's allowed into a
//! `RootCauseVerdict` or `Recommendation`. A violation triggers a retry with
//! feedback (capped) and then a deterministic fallback; nothing the model
//! says is trusted on its own.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{Action, AdSummary, Evidence, ProbeKind, Recommendation, RootCauseTag};
use crate::rca::resolve_tag;

pub const VALIDATOR_RETRY_MAX: u32 = 2;

const RATIO_TOLERANCE: f64 = 0.01;
const Z_SCORE_TOLERANCE: f64 = 0.05;

fn spend_tolerance() -> Decimal {
    Decimal::new(100, 2) // $1.00
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub check: CheckKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    SchemaCompleteness,
    EnumMembership,
    NumericGrounding,
    ChainCompleteness,
    ArithmeticConsistency,
}

/// What the model claims about a diagnosis, before it has been checked
/// against the evidence chain that was actually gathered.
#[derive(Debug, Clone)]
pub struct ProposedVerdict {
    pub tag: RootCauseTag,
    pub cited_probes: Vec<ProbeKind>,
    pub narrative: String,
}

pub struct GroundedValidator;

impl GroundedValidator {
    /// Validates a model-proposed verdict against the evidence chain that
    /// was actually collected. Returns every violation found; an empty
    /// vector means the proposal may be accepted as-is.
    pub fn validate_verdict(proposed: &ProposedVerdict, evidence_chain: &[Evidence]) -> Vec<Violation> {
        let mut violations = Vec::new();

        if proposed.narrative.trim().is_empty() {
            violations.push(Violation {
                check: CheckKind::SchemaCompleteness,
                message: "narrative is empty".into(),
            });
        }

        if proposed.cited_probes.iter().any(|p| !evidence_chain.iter().any(|e| e.probe == *p)) {
            violations.push(Violation {
                check: CheckKind::ChainCompleteness,
                message: "verdict cites a probe that was never run".into(),
            });
        }

        let deterministic_tag = resolve_tag(evidence_chain);
        if proposed.tag != deterministic_tag {
            violations.push(Violation {
                check: CheckKind::EnumMembership,
                message: format!(
                    "proposed tag {:?} does not match the tag the evidence chain resolves to ({:?})",
                    proposed.tag, deterministic_tag
                ),
            });
        }

        violations
    }

    /// Validates a recommendation's arithmetic and its grounding in the
    /// summary it was derived from.
    pub fn validate_recommendation(
        rec: &Recommendation,
        summary: &AdSummary,
        observed_roas: Decimal,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();

        if !matches!(
            rec.action,
            Action::Scale
                | Action::Reduce
                | Action::Pause
                | Action::RefreshCreative
                | Action::Monitor
                | Action::Wait
        ) {
            violations.push(Violation {
                check: CheckKind::EnumMembership,
                message: format!("action {:?} is outside the closed action set", rec.action),
            });
        }

        if (rec.current_spend - summary.spend).abs() > spend_tolerance() {
            violations.push(Violation {
                check: CheckKind::NumericGrounding,
                message: format!(
                    "recommendation current_spend {} does not match summary spend {}",
                    rec.current_spend, summary.spend
                ),
            });
        }

        let expected = (rec.proposed_new_spend - rec.current_spend) * observed_roas;
        let diff = (expected - rec.expected_revenue_change).abs();
        let relative = if expected.abs() > Decimal::ZERO {
            (diff / expected.abs()).to_f64().unwrap_or(1.0)
        } else if rec.expected_revenue_change.abs() > Decimal::ZERO {
            1.0
        } else {
            0.0
        };
        if relative > RATIO_TOLERANCE {
            violations.push(Violation {
                check: CheckKind::ArithmeticConsistency,
                message: format!(
                    "expected_revenue_change {} does not match (proposed - current) * roas = {expected}",
                    rec.expected_revenue_change
                ),
            });
        }

        violations
    }

    pub fn z_score_within_tolerance(claimed: f64, actual: f64) -> bool {
        (claimed - actual).abs() <= Z_SCORE_TOLERANCE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Provider, RootCauseTag};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn summary() -> AdSummary {
        AdSummary {
            ad_id: "a1".into(),
            provider: Provider::GoogleAds,
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
        }
    }

    #[test]
    fn flags_tag_mismatch_against_evidence() {
        let chain = vec![]; // resolves to Unknown
        let proposed = ProposedVerdict {
            tag: RootCauseTag::CpmSpike,
            cited_probes: vec![],
            narrative: "looks like a cpm spike".into(),
        };
        let violations = GroundedValidator::validate_verdict(&proposed, &chain);
        assert!(violations.iter().any(|v| v.check == CheckKind::EnumMembership));
    }

    #[test]
    fn flags_arithmetic_inconsistency() {
        let rec = Recommendation {
            ad_id: "a1".into(),
            action: crate::domain::Action::Scale,
            current_spend: dec!(1000.0),
            proposed_new_spend: dec!(1500.0),
            expected_revenue_change: dec!(999999.0),
            rationale: "bad arithmetic".into(),
            cites_root_cause: None,
        };
        let violations = GroundedValidator::validate_recommendation(&rec, &summary(), dec!(3.0));
        assert!(violations.iter().any(|v| v.check == CheckKind::ArithmeticConsistency));
    }
}
