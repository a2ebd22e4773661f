//! cinerank-ui library - ranking service module
//!
//! Owns the ranking session engine and exposes it over an axum HTTP API plus
//! an SSE event stream. The binary in `main.rs` wires configuration, the
//! SQLite-backed store, and the poster client into [`AppState`] and serves
//! [`build_router`].

use axum::routing::{delete, get, post};
use axum::Router;
use cinerank_common::events::EventBus;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod api;
pub mod seed;
pub mod services;
pub mod session;
pub mod store;

use services::PosterClient;
use session::SessionManager;
use store::SqliteRankingStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager<SqliteRankingStore>>,
    pub posters: Arc<PosterClient>,
    pub bus: Arc<EventBus>,
}

impl AppState {
    pub fn new(
        sessions: Arc<SessionManager<SqliteRankingStore>>,
        posters: Arc<PosterClient>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            sessions,
            posters,
            bus,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(api::health::health))
        // Session state and ranking decisions
        .route("/rankings", get(api::rankings::get_rankings))
        .route("/rankings/decision", post(api::rankings::post_decision))
        .route("/rankings/reorder", post(api::rankings::reorder))
        .route("/rankings/reset", post(api::rankings::reset))
        .route("/rankings/stats", get(api::rankings::get_stats))
        // Item intake and removal
        .route("/rankings/items", post(api::items::add_item))
        .route("/rankings/items/:item_id", delete(api::items::remove_item))
        // SSE event stream
        .route("/events", get(api::sse::event_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
