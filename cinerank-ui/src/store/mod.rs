//! Persistence adapter for partition list snapshots
//!
//! The session never touches SQL directly; it talks to a [`RankingStore`],
//! which loads and saves whole snapshots of both lists for one partition.
//! Every save replaces the entire document, so writes landing out of issuance
//! order resolve to last-writer-wins without corruption.

mod sqlite;

pub use sqlite::SqliteRankingStore;

use cinerank_common::{PartitionKey, RankItem, Result};
use std::future::Future;

/// Both lists of one partition, as loaded from storage
#[derive(Debug, Clone, Default)]
pub struct PartitionLists {
    pub ranked: Vec<RankItem>,
    pub unranked: Vec<RankItem>,
}

/// Load/save contract for partition documents
pub trait RankingStore: Send + Sync + 'static {
    /// Load both lists for a partition.
    ///
    /// Fails soft: `None` means "no document stored or unreadable" and is
    /// never an error at the call site; implementations log the cause.
    fn load(&self, key: &PartitionKey) -> impl Future<Output = Option<PartitionLists>> + Send;

    /// Persist a whole snapshot of both lists.
    ///
    /// Called fire-and-forget after every mutation; a failure is logged by
    /// the caller and never rolls back in-memory state.
    fn save(
        &self,
        key: &PartitionKey,
        ranked: Vec<RankItem>,
        unranked: Vec<RankItem>,
    ) -> impl Future<Output = Result<()>> + Send;
}
