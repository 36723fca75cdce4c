use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::address::normalize_address;
use crate::api::health::HealthSnapshot;
use crate::error::AppError;
use crate::pipeline::ServiceContext;
use crate::types::{CommitReceipt, DataSource, OrchestrationResult, SuspiciousActivity};

#[derive(Clone)]
pub struct ApiState {
    pub ctx: Arc<ServiceContext>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/score/:address", get(get_score).post(post_score))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub contract_readable: bool,
    pub contract_writable: bool,
    #[serde(flatten)]
    pub counters: HealthSnapshot,
}

#[derive(Serialize)]
pub struct StoredScoreResponse {
    pub address: String,
    pub score: u64,
    pub timestamp: String,
}

/// Full scoring result. Metric fields sit at the top level, next to the score.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResponse {
    pub address: String,
    pub score: u8,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<CommitReceipt>,
    /// Set when the on-chain write did not land.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
    pub data_source: DataSource,
    pub tx_count: u64,
    pub wallet_age: u64,
    pub contract_interactions: u64,
    pub token_diversity: u64,
    pub token_balance: f64,
    pub suspicious_activity: SuspiciousActivity,
    pub is_fallback: bool,
}

impl From<OrchestrationResult> for ScoreResponse {
    fn from(r: OrchestrationResult) -> Self {
        let m = r.metrics;
        Self {
            data_source: m.data_source(),
            address: r.address,
            score: r.evaluation.score,
            reason: r.evaluation.reason,
            transaction: r.commit.receipt().cloned(),
            error: r.commit.error().map(str::to_string),
            timestamp: timestamp(),
            tx_count: m.tx_count,
            wallet_age: m.wallet_age_days,
            contract_interactions: m.contract_interactions,
            token_diversity: m.token_diversity,
            token_balance: m.token_balance,
            suspicious_activity: m.suspicious_activity,
            is_fallback: m.is_fallback,
        }
    }
}

#[derive(Serialize)]
pub struct LatencyResponse {
    pub samples: u64,
    pub p50_ms: Option<u64>,
    pub p95_ms: Option<u64>,
    pub p99_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: timestamp(),
        contract_readable: state.ctx.committer.can_read(),
        contract_writable: state.ctx.committer.can_commit(),
        counters: state.ctx.health.snapshot(),
    })
}

/// Stored score only; never triggers a new evaluation.
async fn get_score(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Result<Json<StoredScoreResponse>, AppError> {
    let address = normalize_address(&address)?;
    let score = state.ctx.committer.read_score(&address).await?;
    if score == 0 {
        return Err(AppError::NotFound(
            "No reputation score found for this wallet".to_string(),
        ));
    }
    info!(address = %address, score, "Served stored score");
    Ok(Json(StoredScoreResponse {
        address,
        score,
        timestamp: timestamp(),
    }))
}

/// Runs the full pipeline. A failed on-chain write still answers 200 with
/// the `error` field set.
async fn post_score(
    State(state): State<ApiState>,
    Path(address): Path<String>,
) -> Result<Json<ScoreResponse>, AppError> {
    let result = state.ctx.score_wallet(&address).await?;
    Ok(Json(result.into()))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<LatencyResponse> {
    let (p50_ms, p95_ms, p99_ms) = state.ctx.latency.percentiles();
    Json(LatencyResponse {
        samples: state.ctx.latency.len(),
        p50_ms,
        p95_ms,
        p99_ms,
    })
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
