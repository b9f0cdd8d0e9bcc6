//! Decision audit trail.
//!
//! Every automated decision the pipeline makes — a root-cause diagnosis, a
//! spend recommendation, an execution outcome — is turned into a
//! `DecisionEvent` so it stays traceable back to the grounded inputs it came
//! from. No agent here calls an external model directly; that happens in
//! [`crate::rca::ModelClient`]. This module only shapes and records the
//! outcome.

pub mod audit;
pub mod contracts;

pub use audit::{diagnosis_event, execution_event, recommendation_event, RcaDecisionRecord};
pub use contracts::{
    AgentId, AgentVersion, ConstraintApplied, ConstraintType, DecisionEvent, DecisionType,
    ValidationError,
};
