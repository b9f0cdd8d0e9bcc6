//! DecisionEvent contract.
//!
//! Defines the schema every automated decision point in the RCA pipeline
//! emits: a root-cause diagnosis, a spend recommendation, or a simulated
//! execution. Kept separate from the domain types themselves so the audit
//! trail schema can evolve without touching `RootCauseVerdict` or
//! `Recommendation`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AgentId, AgentVersion, InputsHash};

/// The decision points that emit a `DecisionEvent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    /// A root-cause tag and confidence resolved from an evidence chain.
    RootCauseDiagnosis,

    /// A spend action proposed for one ad.
    Recommendation,

    /// A dry-run execution outcome for one ad.
    ExecutionSimulation,
}

impl std::fmt::Display for DecisionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RootCauseDiagnosis => write!(f, "root_cause_diagnosis"),
            Self::Recommendation => write!(f, "recommendation"),
            Self::ExecutionSimulation => write!(f, "execution_simulation"),
        }
    }
}

/// Bounds and thresholds a decision was checked against on its way out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    /// RCA loop step cap (`rca.max_steps`).
    MaxProbeSteps,

    /// Validator retry-with-feedback cap (`validator.retry_max`).
    ValidatorRetryCap,

    /// Minimum confidence a verdict must clear to be reported as-is.
    MinConfidence,

    /// Spend floor below which an ad cannot be paused (`pause_spend_floor`).
    SpendFloor,
}

/// A constraint that was checked during a decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintApplied {
    pub constraint_type: ConstraintType,
    pub name: String,
    pub value: serde_json::Value,
    pub satisfied: bool,
    pub impact: Option<String>,
}

impl ConstraintApplied {
    pub fn max_probe_steps(name: impl Into<String>, value: f64, satisfied: bool) -> Self {
        Self {
            constraint_type: ConstraintType::MaxProbeSteps,
            name: name.into(),
            value: serde_json::json!(value),
            satisfied,
            impact: None,
        }
    }

    pub fn validator_retry_cap(name: impl Into<String>, value: f64, satisfied: bool) -> Self {
        Self {
            constraint_type: ConstraintType::ValidatorRetryCap,
            name: name.into(),
            value: serde_json::json!(value),
            satisfied,
            impact: None,
        }
    }

    pub fn min_confidence(name: impl Into<String>, value: f64, satisfied: bool) -> Self {
        Self {
            constraint_type: ConstraintType::MinConfidence,
            name: name.into(),
            value: serde_json::json!(value),
            satisfied,
            impact: None,
        }
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = Some(impact.into());
        self
    }
}

/// Audit record emitted for every decision the pipeline makes: which agent
/// (code, not a human) made it, what it was grounded on, and what bounds it
/// was checked against. Never persisted by this crate; a caller wires this
/// to whatever audit sink it uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    pub id: Uuid,
    pub agent_id: AgentId,
    pub agent_version: AgentVersion,
    pub decision_type: DecisionType,
    pub inputs_hash: InputsHash,
    pub outputs: serde_json::Value,
    /// 0.0-1.0. For diagnoses, derived from `Confidence`; recommendations
    /// and execution outcomes are always fully grounded, so 1.0.
    pub confidence: f64,
    pub constraints_applied: Vec<ConstraintApplied>,
    pub execution_ref: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl DecisionEvent {
    pub fn new(
        agent_id: AgentId,
        agent_version: AgentVersion,
        decision_type: DecisionType,
        inputs_hash: InputsHash,
        outputs: serde_json::Value,
        confidence: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            agent_id,
            agent_version,
            decision_type,
            inputs_hash,
            outputs,
            confidence: confidence.clamp(0.0, 1.0),
            constraints_applied: Vec::new(),
            execution_ref: None,
            timestamp: Utc::now(),
            organization_id: None,
            project_id: None,
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_constraints(mut self, constraints: Vec<ConstraintApplied>) -> Self {
        self.constraints_applied = constraints;
        self
    }

    pub fn with_execution_ref(mut self, exec_ref: impl Into<String>) -> Self {
        self.execution_ref = Some(exec_ref.into());
        self
    }

    pub fn with_organization(mut self, org_id: impl Into<String>) -> Self {
        self.organization_id = Some(org_id.into());
        self
    }

    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn validate(&self) -> Result<(), super::ValidationError> {
        if self.confidence < 0.0 || self.confidence > 1.0 {
            return Err(super::ValidationError::InvalidField {
                field: "confidence".to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if self.agent_id.0.is_empty() {
            return Err(super::ValidationError::RequiredField("agent_id".to_string()));
        }
        if self.agent_version.0.is_empty() {
            return Err(super::ValidationError::RequiredField(
                "agent_version".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_event_creation() {
        let event = DecisionEvent::new(
            AgentId::new("rca-orchestrator"),
            AgentVersion::new("1.0.0"),
            DecisionType::RootCauseDiagnosis,
            InputsHash::compute(b"test input"),
            serde_json::json!({"tag": "cpm_spike"}),
            0.95,
        );
        assert!(!event.id.is_nil());
        assert_eq!(event.confidence, 0.95);
        assert_eq!(event.decision_type, DecisionType::RootCauseDiagnosis);
    }

    #[test]
    fn decision_event_validation() {
        let valid_event = DecisionEvent::new(
            AgentId::new("rca-orchestrator"),
            AgentVersion::new("1.0.0"),
            DecisionType::Recommendation,
            InputsHash::compute(b"test"),
            serde_json::json!({}),
            1.0,
        );
        assert!(valid_event.validate().is_ok());

        let invalid_event = DecisionEvent::new(
            AgentId::new(""),
            AgentVersion::new("1.0.0"),
            DecisionType::Recommendation,
            InputsHash::compute(b"test"),
            serde_json::json!({}),
            1.0,
        );
        assert!(invalid_event.validate().is_err());
    }

    #[test]
    fn confidence_clamping() {
        let event = DecisionEvent::new(
            AgentId::new("rca-orchestrator"),
            AgentVersion::new("1.0.0"),
            DecisionType::RootCauseDiagnosis,
            InputsHash::compute(b"test"),
            serde_json::json!({}),
            1.5,
        );
        assert_eq!(event.confidence, 1.0);

        let event2 = DecisionEvent::new(
            AgentId::new("rca-orchestrator"),
            AgentVersion::new("1.0.0"),
            DecisionType::RootCauseDiagnosis,
            InputsHash::compute(b"test"),
            serde_json::json!({}),
            -0.5,
        );
        assert_eq!(event2.confidence, 0.0);
    }

    #[test]
    fn constraint_applied_helpers() {
        let constraint = ConstraintApplied::max_probe_steps("rca.max_steps", 6.0, true)
            .with_impact("within loop bound");
        assert_eq!(constraint.constraint_type, ConstraintType::MaxProbeSteps);
        assert!(constraint.satisfied);
        assert_eq!(constraint.impact, Some("within loop bound".to_string()));
    }

    #[test]
    fn decision_type_display() {
        assert_eq!(
            DecisionType::RootCauseDiagnosis.to_string(),
            "root_cause_diagnosis"
        );
        assert_eq!(DecisionType::Recommendation.to_string(), "recommendation");
    }
}
