//! Session state and ranking decision handlers

use super::{error_response, PartitionQuery, StatusResponse};
use crate::session::SessionSnapshot;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use cinerank_common::{Category, CategoryStats, RankItem};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

type HandlerResult<T> = Result<Json<T>, (StatusCode, Json<StatusResponse>)>;

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    /// Answer to "is the new item better than the item at the compare index?"
    #[serde(rename = "isBetter")]
    is_better: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    /// Full permutation of the current ranked ids
    order: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    owner: String,
    epoch: i32,
    category: Category,
    /// Size of the top/bottom slices (default 5)
    count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    stats: CategoryStats,
    top: Vec<RankItem>,
    bottom: Vec<RankItem>,
}

/// GET /rankings - Activate the partition and return its session state
pub async fn get_rankings(
    State(state): State<AppState>,
    Query(partition): Query<PartitionQuery>,
) -> Json<SessionSnapshot> {
    Json(state.sessions.snapshot(&partition.key()).await)
}

/// POST /rankings/decision - Drive the in-flight comparison one step
pub async fn post_decision(
    State(state): State<AppState>,
    Query(partition): Query<PartitionQuery>,
    Json(request): Json<DecisionRequest>,
) -> HandlerResult<SessionSnapshot> {
    state
        .sessions
        .decide(&partition.key(), request.is_better)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /rankings/reorder - Replace the ranked sequence with a manual order
pub async fn reorder(
    State(state): State<AppState>,
    Query(partition): Query<PartitionQuery>,
    Json(request): Json<ReorderRequest>,
) -> HandlerResult<SessionSnapshot> {
    state
        .sessions
        .reorder(&partition.key(), &request.order)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /rankings/reset - Clear both lists of the partition
pub async fn reset(
    State(state): State<AppState>,
    Query(partition): Query<PartitionQuery>,
) -> HandlerResult<SessionSnapshot> {
    state
        .sessions
        .reset_partition(&partition.key())
        .await
        .map(Json)
        .map_err(error_response)
}

/// GET /rankings/stats - Progress counters plus top/bottom slices
pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Json<StatsResponse> {
    let key = cinerank_common::PartitionKey {
        owner: query.owner.clone(),
        epoch: query.epoch,
        category: query.category,
    };
    let count = query.count.unwrap_or(5);

    let stats = state.sessions.stats(&key).await;
    let top = state.sessions.top(&key, count).await;
    let bottom = state.sessions.bottom(&key, count).await;

    Json(StatsResponse { stats, top, bottom })
}
