//! Ranking session engine
//!
//! **Responsibilities:**
//! - Owns the ranked sequence and unranked queue per partition
//! - Drives the binary-insertion procedure across asynchronous user decisions
//! - Maintains list invariants (disjoint ids, in-flight item = queue head)
//! - Persists a whole snapshot after every mutation and emits session events
//!
//! Mutations are applied synchronously under one write lock (single logical
//! writer per partition); persistence is a spawned background write of a
//! cloned snapshot that the mutation path never waits on. A failed save keeps
//! the optimistic in-memory state and is only logged.

pub mod insertion;

use crate::seed::{self, SeedLists};
use crate::store::RankingStore;
use chrono::Utc;
use cinerank_common::events::{EventBus, RankEvent};
use cinerank_common::{CategoryStats, Error, PartitionKey, RankItem, Result};
use insertion::{Placement, SearchWindow, Step};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// In-flight binary-search bookkeeping for the item currently being placed
///
/// Present only while a comparison is mid-flight; the current item is always
/// the head of the partition's unranked queue.
#[derive(Debug, Clone)]
struct ComparisonState {
    current: RankItem,
    window: SearchWindow,
}

/// Working state of one partition
#[derive(Debug, Default)]
struct PartitionSession {
    /// Descending preference order, index 0 = best
    ranked: Vec<RankItem>,
    /// FIFO intake queue
    unranked: VecDeque<RankItem>,
    comparison: Option<ComparisonState>,
}

struct Inner {
    partitions: HashMap<PartitionKey, PartitionSession>,
    /// Owner identity -> the partition that owner is currently working in
    active: HashMap<String, PartitionKey>,
}

/// Read-only view of an in-flight comparison
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSnapshot {
    /// The item being placed
    pub current_item: RankItem,
    /// The ranked item it is compared against
    pub against_item: RankItem,
    pub min: usize,
    pub max: usize,
    pub compare_index: usize,
    /// 1-based rank of the item compared against
    pub against_rank: usize,
    /// Best possible 1-based rank for the current item
    pub candidate_best_rank: usize,
    /// Worst possible 1-based rank for the current item
    pub candidate_worst_rank: usize,
}

/// Read-only view of one partition's session state
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub ranked: Vec<RankItem>,
    pub unranked: Vec<RankItem>,
    pub comparison: Option<ComparisonSnapshot>,
    pub stats: CategoryStats,
}

/// Per-partition ranking sessions behind one writer lock
pub struct SessionManager<S> {
    store: Arc<S>,
    bus: Arc<EventBus>,
    seeds: SeedLists,
    inner: RwLock<Inner>,
}

impl<S: RankingStore> SessionManager<S> {
    pub fn new(store: Arc<S>, bus: Arc<EventBus>, seeds: SeedLists) -> Self {
        Self {
            store,
            bus,
            seeds,
            inner: RwLock::new(Inner {
                partitions: HashMap::new(),
                active: HashMap::new(),
            }),
        }
    }

    /// Activate a partition for its owner and return its current state
    ///
    /// Loads the stored document on first touch (seeding the queue when the
    /// partition was never stored) and immediately advances: a non-empty
    /// queue either starts a comparison or drains directly into an empty
    /// ranked sequence.
    pub async fn snapshot(&self, key: &PartitionKey) -> SessionSnapshot {
        let mut inner = self.inner.write().await;
        self.touch(&mut inner, key).await;
        inner
            .partitions
            .get(key)
            .map(PartitionSession::snapshot)
            .unwrap_or_default()
    }

    /// Add a title to the tail of the unranked queue
    ///
    /// Titles are trimmed; empty-after-trim input is rejected without any
    /// state change or persist call.
    pub async fn add_item(&self, key: &PartitionKey, title: &str) -> Result<RankItem> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::InvalidInput("title must not be empty".to_string()));
        }

        let mut inner = self.inner.write().await;
        self.touch(&mut inner, key).await;
        let session = session_mut(&mut inner, key)?;

        let item = RankItem::new(title, key.category);
        session.unranked.push_back(item.clone());
        info!("Added {:?} to {} queue", item.title, key);

        self.persist(key, session);
        self.bus.emit(RankEvent::ItemAdded {
            partition: key.clone(),
            item: item.clone(),
            queue_position: session.unranked.len() - 1,
            timestamp: Utc::now(),
        });
        self.advance(key, session);

        Ok(item)
    }

    /// Apply one answer to the in-flight comparison
    ///
    /// `is_better` answers "is the new item better than the item currently at
    /// the compare index?". Either narrows the search window in place or
    /// settles the insertion: splice into the ranked sequence, dequeue, and
    /// advance to the next queued item.
    pub async fn decide(&self, key: &PartitionKey, is_better: bool) -> Result<SessionSnapshot> {
        let mut inner = self.inner.write().await;
        self.touch(&mut inner, key).await;
        let session = session_mut(&mut inner, key)?;

        let Some(mut state) = session.comparison.take() else {
            return Err(Error::InvalidInput(
                "no comparison in progress".to_string(),
            ));
        };

        match insertion::decide(state.window, is_better) {
            Step::Continue(window) => {
                state.window = window;
                let current = state.current.clone();
                let against = session.ranked[window.compare_index].clone();
                session.comparison = Some(state);
                debug!(
                    "Comparison narrowed for {}: min={} max={} compare_index={}",
                    key, window.min, window.max, window.compare_index
                );
                self.bus.emit(RankEvent::ComparisonStarted {
                    partition: key.clone(),
                    current,
                    against,
                    compare_index: window.compare_index,
                    timestamp: Utc::now(),
                });
            }
            Step::Settled(index) => {
                // The in-flight item is always the queue head
                session.unranked.pop_front();
                session.ranked.insert(index, state.current.clone());
                info!("Placed {:?} at rank {} in {}", state.current.title, index + 1, key);

                self.persist(key, session);
                self.bus.emit(RankEvent::ItemRanked {
                    partition: key.clone(),
                    item: state.current,
                    index,
                    timestamp: Utc::now(),
                });
                self.advance(key, session);
            }
        }

        Ok(session.snapshot())
    }

    /// Remove an item by id from whichever list holds it
    ///
    /// Removing the in-flight item or any ranked item discards the in-flight
    /// comparison (ranked indices can no longer be trusted); the session
    /// re-enters IDLE and immediately starts over with the next queue head.
    /// Removing a queued-but-not-in-flight item leaves the comparison alone.
    pub async fn remove_item(&self, key: &PartitionKey, id: Uuid) -> Result<SessionSnapshot> {
        let mut inner = self.inner.write().await;
        self.touch(&mut inner, key).await;
        let session = session_mut(&mut inner, key)?;

        let in_flight = session
            .comparison
            .as_ref()
            .is_some_and(|state| state.current.id == id);

        let from_ranked;
        if in_flight {
            session.comparison = None;
            session.unranked.retain(|item| item.id != id);
            from_ranked = false;
        } else if let Some(pos) = session.ranked.iter().position(|item| item.id == id) {
            session.ranked.remove(pos);
            if session.comparison.take().is_some() {
                debug!("Discarded in-flight comparison for {}: ranked indices invalidated", key);
            }
            from_ranked = true;
        } else if let Some(pos) = session.unranked.iter().position(|item| item.id == id) {
            session.unranked.remove(pos);
            from_ranked = false;
        } else {
            return Err(Error::NotFound(format!("item {}", id)));
        }

        info!("Removed item {} from {}", id, key);
        self.persist(key, session);
        self.bus.emit(RankEvent::ItemRemoved {
            partition: key.clone(),
            item_id: id,
            from_ranked,
            timestamp: Utc::now(),
        });
        self.advance(key, session);

        Ok(session.snapshot())
    }

    /// Replace the ranked sequence with a manual ordering
    ///
    /// `order` must be a permutation of the current ranked ids (drag-reorder
    /// input is trusted, not re-validated against comparison history). An
    /// in-flight comparison keeps its window: the permutation preserves list
    /// length, so the search simply continues against whatever item now
    /// occupies the compare index.
    pub async fn reorder(&self, key: &PartitionKey, order: &[Uuid]) -> Result<SessionSnapshot> {
        let mut inner = self.inner.write().await;
        self.touch(&mut inner, key).await;
        let session = session_mut(&mut inner, key)?;

        let current_ids: HashSet<Uuid> = session.ranked.iter().map(|item| item.id).collect();
        let mut seen = HashSet::new();
        let is_permutation = order.len() == current_ids.len()
            && order
                .iter()
                .all(|id| current_ids.contains(id) && seen.insert(*id));
        if !is_permutation {
            return Err(Error::InvalidInput(
                "reorder must be a permutation of the ranked list".to_string(),
            ));
        }

        let mut by_id: HashMap<Uuid, RankItem> = session
            .ranked
            .drain(..)
            .map(|item| (item.id, item))
            .collect();
        session.ranked = order.iter().filter_map(|id| by_id.remove(id)).collect();

        info!("Reordered ranked list of {} ({} items)", key, session.ranked.len());
        self.persist(key, session);
        self.bus.emit(RankEvent::ListReordered {
            partition: key.clone(),
            timestamp: Utc::now(),
        });

        Ok(session.snapshot())
    }

    /// Clear both lists and persist the empty document
    pub async fn reset_partition(&self, key: &PartitionKey) -> Result<SessionSnapshot> {
        let mut inner = self.inner.write().await;
        self.touch(&mut inner, key).await;
        let session = session_mut(&mut inner, key)?;

        session.ranked.clear();
        session.unranked.clear();
        session.comparison = None;

        info!("Reset partition {}", key);
        self.persist(key, session);
        self.bus.emit(RankEvent::PartitionReset {
            partition: key.clone(),
            timestamp: Utc::now(),
        });

        Ok(session.snapshot())
    }

    /// Record a resolved poster url for an item
    ///
    /// Checks the ranked list first, then the unranked queue (the item may
    /// have moved between lookup start and completion). Returns false without
    /// persisting when the stored url is already current or the item has left
    /// the partition. Never alters ordering.
    ///
    /// Invoked from background lookup tasks, so this does not go through the
    /// activation path: it must not switch the owner's active partition.
    pub async fn update_artwork(
        &self,
        key: &PartitionKey,
        id: Uuid,
        poster_url: &str,
    ) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let Some(session) = inner.partitions.get_mut(key) else {
            debug!("Artwork for {} arrived before partition {} was loaded", id, key);
            return Ok(false);
        };

        let item = session
            .ranked
            .iter_mut()
            .find(|item| item.id == id)
            .or_else(|| session.unranked.iter_mut().find(|item| item.id == id));

        let Some(item) = item else {
            debug!("Artwork for {} arrived after the item left {}", id, key);
            return Ok(false);
        };

        if item.poster_url.as_deref() == Some(poster_url) {
            return Ok(false);
        }

        item.poster_url = Some(poster_url.to_string());
        debug!("Updated artwork for {} in {}", id, key);

        self.persist(key, session);
        self.bus.emit(RankEvent::ArtworkUpdated {
            partition: key.clone(),
            item_id: id,
            poster_url: poster_url.to_string(),
            timestamp: Utc::now(),
        });

        Ok(true)
    }

    /// Progress counters for a partition
    pub async fn stats(&self, key: &PartitionKey) -> CategoryStats {
        self.snapshot(key).await.stats
    }

    /// Best `count` items in rank order
    pub async fn top(&self, key: &PartitionKey, count: usize) -> Vec<RankItem> {
        let snapshot = self.snapshot(key).await;
        snapshot.ranked.into_iter().take(count).collect()
    }

    /// Worst `count` items, still in rank order (best of them first)
    pub async fn bottom(&self, key: &PartitionKey, count: usize) -> Vec<RankItem> {
        let snapshot = self.snapshot(key).await;
        let skip = snapshot.ranked.len().saturating_sub(count);
        snapshot.ranked.into_iter().skip(skip).collect()
    }

    /// Ensure the partition is loaded, make it the owner's active partition,
    /// and advance its state machine.
    ///
    /// Switching away from another partition discards that partition's
    /// in-flight comparison rather than repairing it.
    async fn touch(&self, inner: &mut Inner, key: &PartitionKey) {
        if !inner.partitions.contains_key(key) {
            let session = match self.store.load(key).await {
                Some(lists) => PartitionSession {
                    ranked: lists.ranked,
                    unranked: lists.unranked.into(),
                    comparison: None,
                },
                None => {
                    // Never stored (or unreadable): hydrate from seed titles
                    let items = seed::hydrate(self.seeds.titles_for(key.category), key.category);
                    if !items.is_empty() {
                        info!("Seeded {} titles into {}", items.len(), key);
                    }
                    PartitionSession {
                        ranked: Vec::new(),
                        unranked: items.into(),
                        comparison: None,
                    }
                }
            };
            inner.partitions.insert(key.clone(), session);
        }

        let previous = inner.active.insert(key.owner.clone(), key.clone());
        let switched = previous.as_ref() != Some(key);
        if let Some(previous) = previous {
            if previous != *key {
                if let Some(prev_session) = inner.partitions.get_mut(&previous) {
                    if prev_session.comparison.take().is_some() {
                        debug!(
                            "Discarded in-flight comparison for {} on switch to {}",
                            previous, key
                        );
                    }
                }
            }
        }

        if switched {
            if let Some(session) = inner.partitions.get(key) {
                self.bus.emit(RankEvent::PartitionActivated {
                    partition: key.clone(),
                    ranked_len: session.ranked.len(),
                    unranked_len: session.unranked.len(),
                    timestamp: Utc::now(),
                });
            }
        }

        if let Some(session) = inner.partitions.get_mut(key) {
            self.advance(key, session);
        }
    }

    /// IDLE re-entry: drain zero-comparison inserts and start the next
    /// comparison if the queue has a head.
    fn advance(&self, key: &PartitionKey, session: &mut PartitionSession) {
        loop {
            if session.comparison.is_some() {
                return;
            }

            match insertion::begin(session.ranked.len()) {
                Placement::Direct(index) => {
                    let Some(item) = session.unranked.pop_front() else {
                        return;
                    };
                    session.ranked.insert(index, item.clone());
                    info!("Placed {:?} directly at rank {} in {}", item.title, index + 1, key);
                    self.persist(key, session);
                    self.bus.emit(RankEvent::ItemRanked {
                        partition: key.clone(),
                        item,
                        index,
                        timestamp: Utc::now(),
                    });
                }
                Placement::Compare(window) => {
                    let Some(current) = session.unranked.front().cloned() else {
                        return;
                    };
                    let against = session.ranked[window.compare_index].clone();
                    session.comparison = Some(ComparisonState {
                        current: current.clone(),
                        window,
                    });
                    debug!(
                        "Comparison started for {:?} in {}: window 0..{}",
                        current.title, key, window.max
                    );
                    self.bus.emit(RankEvent::ComparisonStarted {
                        partition: key.clone(),
                        current,
                        against,
                        compare_index: window.compare_index,
                        timestamp: Utc::now(),
                    });
                    return;
                }
            }
        }
    }

    /// Fire-and-forget snapshot write; failure keeps the in-memory state
    fn persist(&self, key: &PartitionKey, session: &PartitionSession) {
        let store = Arc::clone(&self.store);
        let key = key.clone();
        let ranked = session.ranked.clone();
        let unranked: Vec<RankItem> = session.unranked.iter().cloned().collect();
        tokio::spawn(async move {
            if let Err(e) = store.save(&key, ranked, unranked).await {
                warn!("Failed to persist partition {}: {}", key, e);
            }
        });
    }
}

fn session_mut<'a>(inner: &'a mut Inner, key: &PartitionKey) -> Result<&'a mut PartitionSession> {
    inner
        .partitions
        .get_mut(key)
        .ok_or_else(|| Error::Internal(format!("partition {} not loaded", key)))
}

impl PartitionSession {
    fn snapshot(&self) -> SessionSnapshot {
        let comparison = self.comparison.as_ref().and_then(|state| {
            self.ranked
                .get(state.window.compare_index)
                .map(|against| ComparisonSnapshot {
                    current_item: state.current.clone(),
                    against_item: against.clone(),
                    min: state.window.min,
                    max: state.window.max,
                    compare_index: state.window.compare_index,
                    against_rank: state.window.compare_index + 1,
                    candidate_best_rank: state.window.min + 1,
                    candidate_worst_rank: state.window.max + 1,
                })
        });

        SessionSnapshot {
            ranked: self.ranked.clone(),
            unranked: self.unranked.iter().cloned().collect(),
            comparison,
            stats: CategoryStats {
                total: self.ranked.len() + self.unranked.len(),
                ranked: self.ranked.len(),
            },
        }
    }
}
