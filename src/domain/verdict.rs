use serde::{Deserialize, Serialize};

use super::evidence::Evidence;

/// The closed root-cause ontology. The model only selects probes and writes
/// prose; mapping evidence to a tag is always done by deterministic code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RootCauseTag {
    CpmSpike,
    CreativeFatigue,
    LandingPage,
    Tracking,
    BudgetExhaustion,
    Seasonality,
    Unknown,
}

impl RootCauseTag {
    /// Fixed tag-to-action hint, used by the recommendation generator to
    /// justify a deviation from the baseline classification table.
    pub fn action_hint(&self) -> &'static str {
        match self {
            RootCauseTag::CpmSpike => "adjust bids or targeting",
            RootCauseTag::CreativeFatigue => "refresh creative",
            RootCauseTag::LandingPage => "investigate landing page experience",
            RootCauseTag::Tracking => "fix conversion tracking",
            RootCauseTag::BudgetExhaustion => "raise daily budget or accept pacing loss",
            RootCauseTag::Seasonality => "monitor, likely self-resolving",
            RootCauseTag::Unknown => "manual review required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// The result of diagnosing a single anomaly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootCauseVerdict {
    pub ad_id: String,
    pub tag: RootCauseTag,
    pub confidence: Confidence,
    pub evidence_chain: Vec<Evidence>,
    pub narrative: String,
    /// Steps actually consumed before resolution, bounded by `rca.max_steps`.
    pub steps_used: u32,
}
