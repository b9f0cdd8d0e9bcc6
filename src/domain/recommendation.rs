use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::verdict::RootCauseTag;

/// The closed action ontology (§3, §4.6). `RefreshCreative` is the one
/// table-external action a `RootCauseVerdict` may steer a recommendation
/// toward; every other deviation a verdict argues for must still resolve to
/// one of these six, with the verdict cited in the rationale instead of a
/// new action member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Scale,
    Monitor,
    Reduce,
    Pause,
    Wait,
    RefreshCreative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub ad_id: String,
    pub action: Action,
    pub current_spend: Decimal,
    pub proposed_new_spend: Decimal,
    /// `(proposed_new_spend - current_spend) * observed_roas`.
    pub expected_revenue_change: Decimal,
    pub rationale: String,
    /// Present when `action` deviates from the guideline table because of a
    /// diagnosed root cause.
    pub cites_root_cause: Option<RootCauseTag>,
}
