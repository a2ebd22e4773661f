//! Item intake and removal handlers

use super::{error_response, PartitionQuery, StatusResponse};
use crate::session::SessionSnapshot;
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cinerank_common::RankItem;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    title: String,
}

#[derive(Debug, Serialize)]
pub struct AddItemResponse {
    status: String,
    item: RankItem,
}

/// POST /rankings/items - Add a title to the unranked queue
///
/// Poster artwork resolves in the background; the response never waits on
/// the lookup.
pub async fn add_item(
    State(state): State<AppState>,
    Query(partition): Query<PartitionQuery>,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<AddItemResponse>, (StatusCode, Json<StatusResponse>)> {
    let key = partition.key();
    let item = state
        .sessions
        .add_item(&key, &request.title)
        .await
        .map_err(error_response)?;

    // Background artwork resolution; its completion feeds back through
    // update_artwork wherever the item lives by then
    let lookup_state = state.clone();
    let lookup_item = item.clone();
    tokio::spawn(async move {
        let Some(url) = lookup_state
            .posters
            .lookup(&lookup_item.title, lookup_item.category)
            .await
        else {
            return;
        };
        match lookup_state
            .sessions
            .update_artwork(&key, lookup_item.id, &url)
            .await
        {
            Ok(true) => debug!("Artwork attached to {:?}", lookup_item.title),
            Ok(false) => {}
            Err(e) => debug!("Artwork update for {:?} not applied: {}", lookup_item.title, e),
        }
    });

    Ok(Json(AddItemResponse {
        status: "ok".to_string(),
        item,
    }))
}

/// DELETE /rankings/items/:item_id - Remove an item from the partition
pub async fn remove_item(
    State(state): State<AppState>,
    Query(partition): Query<PartitionQuery>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, (StatusCode, Json<StatusResponse>)> {
    state
        .sessions
        .remove_item(&partition.key(), item_id)
        .await
        .map(Json)
        .map_err(error_response)
}
