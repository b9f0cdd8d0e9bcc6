use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::anomaly::Anomaly;
use super::baseline::AccountBaseline;
use super::evidence::Evidence;
use super::recommendation::Recommendation;
use super::summary::AdSummary;
use super::verdict::RootCauseVerdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        SessionId(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The sole owner of all state derived during one `analyze -> recommend ->
/// execute` lifecycle. Never persisted; lost on process restart and expired
/// after `ttl_seconds` of inactivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub tenant: String,
    pub window_days: u32,
    pub created_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
    pub ttl_seconds: u64,

    pub summaries: Vec<AdSummary>,
    pub baseline: AccountBaseline,
    pub anomalies: Vec<Anomaly>,
    pub evidence: HashMap<String, Vec<Evidence>>,
    pub verdicts: HashMap<String, RootCauseVerdict>,
    pub recommendations: Vec<Recommendation>,

    pub insufficient_data: bool,
    pub records_dropped: u64,

    /// Serialized `agents::DecisionEvent`s for every diagnosis, recommendation,
    /// and execution decided within this session. Kept in-memory only, per
    /// the "no persisted state" contract; domain types stay independent of
    /// the audit-trail module, so entries are stored pre-serialized.
    pub decision_log: Vec<serde_json::Value>,
}

impl Session {
    pub fn new(tenant: impl Into<String>, window_days: u32, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Session {
            id: SessionId::new(),
            tenant: tenant.into(),
            window_days,
            created_at: now,
            last_accessed_at: now,
            ttl_seconds,
            summaries: Vec::new(),
            baseline: AccountBaseline::default(),
            anomalies: Vec::new(),
            evidence: HashMap::new(),
            verdicts: HashMap::new(),
            recommendations: Vec::new(),
            insufficient_data: false,
            records_dropped: 0,
            decision_log: Vec::new(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let idle = now.signed_duration_since(self.last_accessed_at);
        idle.num_seconds() >= self.ttl_seconds as i64
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed_at = now;
    }
}
