//! Domain models shared across cinerank crates

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of rankable titles.
///
/// Serialized as `"FILM"` / `"SERIES"` on the wire and in persisted
/// documents; database partition keys use the lowercase form from
/// [`Category::as_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "FILM")]
    Film,
    #[serde(rename = "SERIES")]
    Series,
}

impl Category {
    /// Stable lowercase key used in database rows
    pub fn as_key(&self) -> &'static str {
        match self {
            Category::Film => "film",
            Category::Series => "series",
        }
    }

    /// Parse the lowercase database key form
    pub fn parse_key(key: &str) -> Option<Self> {
        match key {
            "film" => Some(Category::Film),
            "series" => Some(Category::Series),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

/// One rankable title.
///
/// Identity is `id`. `title` and `poster_url` are mutable metadata and never
/// affect ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankItem {
    pub id: Uuid,
    pub title: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
}

impl RankItem {
    /// Construct a new item with a fresh id and no artwork
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            category,
            poster_url: None,
        }
    }
}

/// Scope of one independent ranking: (owner identity, epoch, category).
///
/// The owner is an opaque identity string supplied by the caller; the epoch is
/// an external grouping key such as a year. Each partition owns exactly one
/// ranked sequence and one unranked queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub owner: String,
    pub epoch: i32,
    pub category: Category,
}

impl std::fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.owner, self.epoch, self.category)
    }
}

/// Progress counters for a partition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Items in the partition (ranked + awaiting ranking)
    pub total: usize,
    /// Items already placed in the ranked sequence
    pub ranked: usize,
}
