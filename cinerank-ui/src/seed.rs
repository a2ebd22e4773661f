//! Initial title seeding
//!
//! The first activation of a partition that has no stored document hydrates
//! its unranked queue from `<root>/seed.toml`:
//!
//! ```toml
//! film = ["Conclave", "Sinners"]
//! series = ["Severance", "Andor"]
//! ```
//!
//! A partition that was stored and later emptied loads as an (empty) document
//! and is not re-seeded.

use cinerank_common::{Category, RankItem};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Seed title lists per category
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedLists {
    #[serde(default)]
    pub film: Vec<String>,
    #[serde(default)]
    pub series: Vec<String>,
}

impl SeedLists {
    pub fn titles_for(&self, category: Category) -> &[String] {
        match category {
            Category::Film => &self.film,
            Category::Series => &self.series,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.film.is_empty() && self.series.is_empty()
    }
}

/// Load the seed file, tolerating absence and parse errors
pub fn load_seed_lists(path: &Path) -> SeedLists {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return SeedLists::default(),
    };

    match toml::from_str::<SeedLists>(&content) {
        Ok(seeds) => {
            info!(
                "Loaded seed lists: {} films, {} series",
                seeds.film.len(),
                seeds.series.len()
            );
            seeds
        }
        Err(e) => {
            warn!("Ignoring unreadable seed file {}: {}", path.display(), e);
            SeedLists::default()
        }
    }
}

/// Turn seed titles into queue items, trimming whitespace and dropping blanks
pub fn hydrate(titles: &[String], category: Category) -> Vec<RankItem> {
    titles
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| RankItem::new(t, category))
        .collect()
}
