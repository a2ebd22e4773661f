//! HTTP request handlers
//!
//! Every session endpoint is scoped by partition query parameters
//! (`owner`, `epoch`, `category`); touching a partition makes it the owner's
//! active partition.

pub mod health;
pub mod items;
pub mod rankings;
pub mod sse;

use axum::http::StatusCode;
use axum::Json;
use cinerank_common::{Category, Error, PartitionKey};
use serde::{Deserialize, Serialize};

/// Generic status payload for error responses
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Partition scope carried by every session endpoint
#[derive(Debug, Deserialize)]
pub struct PartitionQuery {
    pub owner: String,
    pub epoch: i32,
    pub category: Category,
}

impl PartitionQuery {
    pub fn key(&self) -> PartitionKey {
        PartitionKey {
            owner: self.owner.clone(),
            epoch: self.epoch,
            category: self.category,
        }
    }
}

/// Map a session error onto an HTTP status + JSON body
pub(crate) fn error_response(err: Error) -> (StatusCode, Json<StatusResponse>) {
    let status = match &err {
        Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(StatusResponse {
            status: format!("error: {}", err),
        }),
    )
}
