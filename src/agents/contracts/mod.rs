//! Agent contracts module.
//!
//! Defines the schemas the audit trail is built from: agent identity,
//! input/output hashing, and the `DecisionEvent` every decision point emits.
//! Kept independent of the domain types so the audit schema can version on
//! its own.

mod decision_event;
mod agent_types;
mod validation;

pub use decision_event::{
    DecisionEvent, DecisionType, ConstraintApplied, ConstraintType,
};
pub use agent_types::{
    AgentId, AgentVersion, AgentInput, AgentOutput,
    InputsHash, OutputsHash,
};
pub use validation::{ValidationError, ValidationResult, Validator};

/// Contract version for schema compatibility.
pub const CONTRACT_VERSION: &str = "1.0.0";

/// Namespace for root-cause diagnosis decision events.
pub const RCA_NAMESPACE: &str = "ad-rca.agents.root-cause";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_version() {
        assert!(!CONTRACT_VERSION.is_empty());
    }
}
