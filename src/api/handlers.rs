//! Handlers for the three pipeline operations.

use std::collections::HashSet;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{AccountBaseline, Recommendation, SessionId};
use crate::execution::{ExecutionResult, ExecutionSummary};
use crate::pipeline::{AnalyzeSummary, RecommendSummary};

use super::{ApiError, ApiState};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub tenant: String,
    pub window_days: u32,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: SessionId,
    pub anomaly_count: usize,
    pub ad_count: usize,
    pub baseline: AccountBaseline,
    pub insufficient_data: bool,
    pub records_dropped: u64,
}

impl From<AnalyzeSummary> for AnalyzeResponse {
    fn from(s: AnalyzeSummary) -> Self {
        Self {
            session_id: s.session_id,
            anomaly_count: s.anomaly_count,
            ad_count: s.ad_count,
            baseline: s.baseline,
            insufficient_data: s.insufficient_data,
            records_dropped: s.records_dropped,
        }
    }
}

pub async fn analyze(
    State(state): State<ApiState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let (_, summary) = state
        .pipeline
        .analyze(&request.tenant, request.window_days)
        .await?;
    Ok(Json(summary.into()))
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub use_model_reasoning: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<Recommendation>,
    pub summary: RecommendSummary,
}

pub async fn recommend(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RecommendRequest>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let session_id = SessionId(id);
    let (recommendations, summary) = state
        .pipeline
        .recommend(session_id, request.use_model_reasoning)
        .await?;
    Ok(Json(RecommendResponse {
        recommendations,
        summary,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExecuteRequest {
    pub approved_ad_ids: Option<HashSet<String>>,
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub results: Vec<ExecutionResult>,
    pub summary: ExecutionSummary,
}

pub async fn execute(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ExecuteRequest>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let session_id = SessionId(id);
    let (results, summary) = state
        .pipeline
        .execute(session_id, request.approved_ad_ids, request.dry_run)
        .await?;
    Ok(Json(ExecuteResponse { results, summary }))
}
