//! Builds audit records for the pipeline's three decision points: a
//! root-cause diagnosis, a spend recommendation, and a simulated execution.
//! Each becomes a `DecisionEvent`; the pipeline collects these per session so
//! every automated decision stays traceable back to its grounding inputs.

use crate::domain::{Confidence, Recommendation, RootCauseVerdict};
use crate::execution::ExecutionSummary;

use super::contracts::{
    AgentId, AgentVersion, ConstraintApplied, DecisionEvent, DecisionType, InputsHash,
};

const AGENT_ID: &str = "rca-orchestrator";
const AGENT_VERSION: &str = "1.0.0";

/// In-session audit record for one automated decision. A `DecisionEvent`
/// under the hood, named for what the pipeline uses it for: every
/// diagnosis, recommendation, and execution outcome is recorded as one of
/// these on its owning `Session`, never persisted beyond the process.
pub type RcaDecisionRecord = DecisionEvent;

fn confidence_score(confidence: Confidence) -> f64 {
    match confidence {
        Confidence::Low => 0.33,
        Confidence::Medium => 0.66,
        Confidence::High => 1.0,
    }
}

/// Audit record for one ad's root-cause verdict.
pub fn diagnosis_event(verdict: &RootCauseVerdict, max_steps: u32, tenant: &str) -> DecisionEvent {
    DecisionEvent::new(
        AgentId::new(AGENT_ID),
        AgentVersion::new(AGENT_VERSION),
        DecisionType::RootCauseDiagnosis,
        InputsHash::compute(&verdict.ad_id),
        serde_json::to_value(verdict).unwrap_or(serde_json::Value::Null),
        confidence_score(verdict.confidence),
    )
    .with_constraints(vec![ConstraintApplied::max_probe_steps(
        "rca.max_steps",
        verdict.steps_used as f64,
        verdict.steps_used <= max_steps,
    )])
    .with_execution_ref(verdict.ad_id.clone())
    .with_organization(tenant.to_string())
}

/// Audit record for one ad's spend recommendation.
pub fn recommendation_event(rec: &Recommendation, tenant: &str) -> DecisionEvent {
    DecisionEvent::new(
        AgentId::new(AGENT_ID),
        AgentVersion::new(AGENT_VERSION),
        DecisionType::Recommendation,
        InputsHash::compute(&rec.ad_id),
        serde_json::to_value(rec).unwrap_or(serde_json::Value::Null),
        1.0,
    )
    .with_execution_ref(rec.ad_id.clone())
    .with_organization(tenant.to_string())
}

/// Audit record for one session's dry-run execution summary.
pub fn execution_event(summary: &ExecutionSummary, session_id: &str, tenant: &str) -> DecisionEvent {
    DecisionEvent::new(
        AgentId::new(AGENT_ID),
        AgentVersion::new(AGENT_VERSION),
        DecisionType::ExecutionSimulation,
        InputsHash::compute(&session_id),
        serde_json::to_value(summary).unwrap_or(serde_json::Value::Null),
        1.0,
    )
    .with_execution_ref(session_id.to_string())
    .with_organization(tenant.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RootCauseTag;

    #[test]
    fn diagnosis_event_carries_confidence() {
        let verdict = RootCauseVerdict {
            ad_id: "a1".into(),
            tag: RootCauseTag::CpmSpike,
            confidence: Confidence::High,
            evidence_chain: vec![],
            narrative: "resolved".into(),
            steps_used: 1,
        };
        let event = diagnosis_event(&verdict, 6, "acme");
        assert_eq!(event.confidence, 1.0);
        assert_eq!(event.organization_id.as_deref(), Some("acme"));
        assert!(event.constraints_applied[0].satisfied);
    }
}
