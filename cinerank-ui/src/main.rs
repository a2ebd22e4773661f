//! cinerank-ui - Pairwise ranking service
//!
//! Builds total orders over film/series titles from one pairwise decision at
//! a time, persisting every partial state so ranking survives restarts.

use anyhow::Result;
use cinerank_common::config;
use cinerank_common::db::init_database;
use cinerank_common::events::EventBus;
use cinerank_ui::services::PosterClient;
use cinerank_ui::session::SessionManager;
use cinerank_ui::store::SqliteRankingStore;
use cinerank_ui::{build_router, seed, AppState};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "cinerank-ui", about = "Pairwise ranking service")]
struct Args {
    /// Root data folder (overrides CINERANK_ROOT and the config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// HTTP listen port (overrides CINERANK_PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Cinerank UI (cinerank-ui) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = config::resolve_root_folder(args.root_folder.as_deref());
    config::ensure_root_folder(&root_folder)?;
    info!("Root folder: {}", root_folder.display());

    let db_path = config::database_path(&root_folder);
    let pool = init_database(&db_path).await?;

    let seeds = seed::load_seed_lists(&config::seed_path(&root_folder));
    let credentials = config::load_artwork_credentials();

    let bus = Arc::new(EventBus::new(1000));
    let store = Arc::new(SqliteRankingStore::new(pool.clone()));
    let sessions = Arc::new(SessionManager::new(store, Arc::clone(&bus), seeds));
    let posters = Arc::new(PosterClient::new(pool, credentials)?);

    let state = AppState::new(sessions, posters, bus);
    let app = build_router(state);

    let port = config::resolve_port(args.port);
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    info!("cinerank-ui listening on http://127.0.0.1:{}", port);
    info!("Health check: http://127.0.0.1:{}/health", port);

    axum::serve(listener, app).await?;

    Ok(())
}
