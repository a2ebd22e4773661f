//! Poster artwork lookup
//!
//! Resolves a poster image url for a title in two hops: an OMDB title search
//! yields an IMDb id, then TMDB's find-by-external-id yields the poster path.
//!
//! Lookups are cached at three levels: an in-memory map for the session
//! lifetime, in-flight de-duplication so concurrent lookups for the same
//! (title, category) collapse into a single request, and the `artwork_cache`
//! table so resolved posters survive restarts. Every failure mode degrades to
//! `None`; artwork never blocks the ranking flow.

use cinerank_common::config::ArtworkCredentials;
use cinerank_common::{Category, Error, Result};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

const OMDB_BASE_URL: &str = "https://www.omdbapi.com/";
const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const USER_AGENT: &str = concat!("cinerank/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// OMDB search response (only the fields we consume)
#[derive(Debug, Deserialize)]
struct OmdbSearchResponse {
    #[serde(rename = "Search")]
    search: Option<Vec<OmdbSearchHit>>,
}

#[derive(Debug, Deserialize)]
struct OmdbSearchHit {
    #[serde(rename = "imdbID")]
    imdb_id: String,
}

/// TMDB find-by-external-id response
#[derive(Debug, Deserialize)]
struct TmdbFindResponse {
    #[serde(default)]
    movie_results: Vec<TmdbHit>,
    #[serde(default)]
    tv_results: Vec<TmdbHit>,
}

#[derive(Debug, Deserialize)]
struct TmdbHit {
    poster_path: Option<String>,
}

type CacheKey = (String, Category);
type CacheCell = Arc<OnceCell<Option<String>>>;

/// Poster lookup client
pub struct PosterClient {
    http: reqwest::Client,
    pool: SqlitePool,
    credentials: Option<ArtworkCredentials>,
    cache: Mutex<HashMap<CacheKey, CacheCell>>,
}

impl PosterClient {
    pub fn new(pool: SqlitePool, credentials: Option<ArtworkCredentials>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Internal(format!("http client: {}", e)))?;

        Ok(Self {
            http,
            pool,
            credentials,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve a poster url for a title, or `None` when unavailable
    ///
    /// Repeat lookups for the same key return instantly from cache;
    /// concurrent lookups share one underlying request. Only successful
    /// resolutions stay cached, so a transient failure is retried on the
    /// next call.
    pub async fn lookup(&self, title: &str, category: Category) -> Option<String> {
        let Some(credentials) = self.credentials.clone() else {
            debug!("Artwork lookup skipped for {:?}: credentials not configured", title);
            return None;
        };

        let cache_key = (title.to_string(), category);
        let cell = {
            let mut cache = self.cache.lock().await;
            cache.entry(cache_key.clone()).or_default().clone()
        };

        let result = cell
            .get_or_init(|| self.resolve(title, category, &credentials))
            .await
            .clone();

        if result.is_none() {
            // Drop the memoized miss so a later lookup can retry
            self.cache.lock().await.remove(&cache_key);
        }

        result
    }

    async fn resolve(
        &self,
        title: &str,
        category: Category,
        credentials: &ArtworkCredentials,
    ) -> Option<String> {
        if let Some(url) = self.cached(title, category).await {
            debug!("Artwork cache hit for {:?}", title);
            return Some(url);
        }

        match self.fetch(title, category, credentials).await {
            Ok(Some(url)) => {
                self.store_cached(title, category, &url).await;
                Some(url)
            }
            Ok(None) => {
                debug!("No artwork match for {:?} ({})", title, category);
                None
            }
            Err(e) => {
                warn!("Artwork lookup failed for {:?}: {}", title, e);
                None
            }
        }
    }

    async fn fetch(
        &self,
        title: &str,
        category: Category,
        credentials: &ArtworkCredentials,
    ) -> std::result::Result<Option<String>, reqwest::Error> {
        // 1. OMDB title search for the IMDb id
        let omdb: OmdbSearchResponse = self
            .http
            .get(OMDB_BASE_URL)
            .query(&[("apikey", credentials.omdb_api_key.as_str()), ("s", title)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(hit) = omdb.search.and_then(|hits| hits.into_iter().next()) else {
            return Ok(None);
        };

        // 2. TMDB find-by-external-id for the poster path
        let tmdb: TmdbFindResponse = self
            .http
            .get(format!("{}/find/{}", TMDB_BASE_URL, hit.imdb_id))
            .query(&[("external_source", "imdb_id")])
            .bearer_auth(&credentials.tmdb_api_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let results = match category {
            Category::Film => tmdb.movie_results,
            Category::Series => tmdb.tv_results,
        };

        Ok(results
            .into_iter()
            .find_map(|hit| hit.poster_path)
            .map(|path| format!("{}{}", TMDB_IMAGE_BASE, path)))
    }

    async fn cached(&self, title: &str, category: Category) -> Option<String> {
        let row = sqlx::query_as::<_, (Option<String>,)>(
            "SELECT poster_url FROM artwork_cache WHERE title = ? AND category = ?",
        )
        .bind(title)
        .bind(category.as_key())
        .fetch_optional(&self.pool)
        .await;

        match row {
            Ok(Some((url,))) => url,
            Ok(None) => None,
            Err(e) => {
                warn!("Artwork cache read failed: {}", e);
                None
            }
        }
    }

    async fn store_cached(&self, title: &str, category: Category, url: &str) {
        let result = sqlx::query(
            r#"
            INSERT INTO artwork_cache (title, category, poster_url, fetched_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT (title, category) DO UPDATE SET
                poster_url = excluded.poster_url,
                fetched_at = excluded.fetched_at
            "#,
        )
        .bind(title)
        .bind(category.as_key())
        .bind(url)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!("Artwork cache write failed: {}", e);
        }
    }
}
