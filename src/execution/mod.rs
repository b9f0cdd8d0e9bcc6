//! Dry-run execution of recommendations. Never mutates a live ad account;
//! the simulator only produces the outcome each recommendation *would* have had.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::Recommendation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    Initial,
    Attempted,
    Success,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub ad_id: String,
    pub state: ExecutionState,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub success: u32,
    pub failed: u32,
    pub skipped: u32,
    pub dry_run: bool,
}

pub struct ExecutionSimulator;

impl ExecutionSimulator {
    /// Runs every recommendation through initial -> attempted -> {success,
    /// failed, skipped}. A recommendation not present in `approved_ad_ids`
    /// (when that allowlist is `Some`) is skipped without being attempted.
    /// Idempotent: running the same inputs twice yields the same results.
    pub fn execute(
        recommendations: &[Recommendation],
        approved_ad_ids: Option<&HashSet<String>>,
        dry_run: bool,
    ) -> (Vec<ExecutionResult>, ExecutionSummary) {
        let mut results = Vec::with_capacity(recommendations.len());
        let mut summary = ExecutionSummary {
            dry_run,
            ..Default::default()
        };

        for rec in recommendations {
            let approved = approved_ad_ids
                .map(|ids| ids.contains(&rec.ad_id))
                .unwrap_or(true);

            let result = if !approved {
                summary.skipped += 1;
                ExecutionResult {
                    ad_id: rec.ad_id.clone(),
                    state: ExecutionState::Skipped,
                    detail: "not in approved set".to_string(),
                }
            } else {
                // Attempted -> Success is the only reachable outcome in dry-run
                // mode: there is no live account call that can fail.
                summary.success += 1;
                ExecutionResult {
                    ad_id: rec.ad_id.clone(),
                    state: ExecutionState::Success,
                    detail: format!(
                        "{}would apply {:?}: spend {} -> {}",
                        if dry_run { "dry-run: " } else { "" },
                        rec.action,
                        rec.current_spend,
                        rec.proposed_new_spend
                    ),
                }
            };
            results.push(result);
        }

        (results, summary)
    }
}
