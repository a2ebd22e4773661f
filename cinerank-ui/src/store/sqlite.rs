//! SQLite-backed ranking store
//!
//! One document row per partition in the `rankings` table; the ranked and
//! unranked lists are stored as JSON columns and replaced wholesale on every
//! save.

use super::{PartitionLists, RankingStore};
use cinerank_common::{Error, PartitionKey, RankItem, Result};
use sqlx::SqlitePool;
use tracing::warn;

#[derive(Clone)]
pub struct SqliteRankingStore {
    pool: SqlitePool,
}

impl SqliteRankingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl RankingStore for SqliteRankingStore {
    async fn load(&self, key: &PartitionKey) -> Option<PartitionLists> {
        let row = sqlx::query_as::<_, (String, String)>(
            "SELECT ranked, unranked FROM rankings WHERE owner = ? AND epoch = ? AND category = ?",
        )
        .bind(&key.owner)
        .bind(key.epoch)
        .bind(key.category.as_key())
        .fetch_optional(&self.pool)
        .await;

        let (ranked_json, unranked_json) = match row {
            Ok(Some(row)) => row,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to load partition {}: {}", key, e);
                return None;
            }
        };

        let ranked: Vec<RankItem> = match serde_json::from_str(&ranked_json) {
            Ok(items) => items,
            Err(e) => {
                warn!("Unreadable ranked document for {}: {}", key, e);
                return None;
            }
        };
        let unranked: Vec<RankItem> = match serde_json::from_str(&unranked_json) {
            Ok(items) => items,
            Err(e) => {
                warn!("Unreadable unranked document for {}: {}", key, e);
                return None;
            }
        };

        Some(PartitionLists { ranked, unranked })
    }

    async fn save(
        &self,
        key: &PartitionKey,
        ranked: Vec<RankItem>,
        unranked: Vec<RankItem>,
    ) -> Result<()> {
        let ranked_json = serde_json::to_string(&ranked)
            .map_err(|e| Error::Internal(format!("serialize ranked list: {}", e)))?;
        let unranked_json = serde_json::to_string(&unranked)
            .map_err(|e| Error::Internal(format!("serialize unranked list: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO rankings (owner, epoch, category, ranked, unranked, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (owner, epoch, category) DO UPDATE SET
                ranked = excluded.ranked,
                unranked = excluded.unranked,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&key.owner)
        .bind(key.epoch)
        .bind(key.category.as_key())
        .bind(ranked_json)
        .bind(unranked_json)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
