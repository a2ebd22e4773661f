//! Event types for the cinerank event system
//!
//! Provides shared event definitions and the EventBus used to fan session
//! changes out to SSE clients.

use crate::models::{PartitionKey, RankItem};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Cinerank event types
///
/// Events are broadcast via [`EventBus`] and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RankEvent {
    /// A partition became the owner's active partition
    PartitionActivated {
        partition: PartitionKey,
        ranked_len: usize,
        unranked_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// A new title entered the unranked queue
    ItemAdded {
        partition: PartitionKey,
        item: RankItem,
        /// Position in the unranked queue (0 = next to be ranked)
        queue_position: usize,
        timestamp: DateTime<Utc>,
    },

    /// A pairing is ready to be presented to the user
    ///
    /// Emitted both when an item begins ranking and after each narrowing
    /// decision that did not settle the search.
    ComparisonStarted {
        partition: PartitionKey,
        /// The item being placed
        current: RankItem,
        /// The ranked item it is compared against
        against: RankItem,
        compare_index: usize,
        timestamp: DateTime<Utc>,
    },

    /// An item was placed into the ranked sequence
    ItemRanked {
        partition: PartitionKey,
        item: RankItem,
        /// Insertion index (0 = best)
        index: usize,
        timestamp: DateTime<Utc>,
    },

    /// An item was deleted from the partition
    ItemRemoved {
        partition: PartitionKey,
        item_id: Uuid,
        /// true if removed from the ranked sequence, false from the queue
        from_ranked: bool,
        timestamp: DateTime<Utc>,
    },

    /// The ranked sequence was manually reordered
    ListReordered {
        partition: PartitionKey,
        timestamp: DateTime<Utc>,
    },

    /// Both lists were cleared
    PartitionReset {
        partition: PartitionKey,
        timestamp: DateTime<Utc>,
    },

    /// An item's poster artwork was resolved
    ArtworkUpdated {
        partition: PartitionKey,
        item_id: Uuid,
        poster_url: String,
        timestamp: DateTime<Utc>,
    },
}

impl RankEvent {
    /// Event name used as the SSE event field
    pub fn name(&self) -> &'static str {
        match self {
            RankEvent::PartitionActivated { .. } => "PartitionActivated",
            RankEvent::ItemAdded { .. } => "ItemAdded",
            RankEvent::ComparisonStarted { .. } => "ComparisonStarted",
            RankEvent::ItemRanked { .. } => "ItemRanked",
            RankEvent::ItemRemoved { .. } => "ItemRemoved",
            RankEvent::ListReordered { .. } => "ListReordered",
            RankEvent::PartitionReset { .. } => "PartitionReset",
            RankEvent::ArtworkUpdated { .. } => "ArtworkUpdated",
        }
    }
}

/// Broadcast bus for session events
///
/// Emission never blocks; events sent with no subscribers are dropped.
pub struct EventBus {
    tx: broadcast::Sender<RankEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RankEvent> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all subscribers
    pub fn emit(&self, event: RankEvent) {
        // send() errors only when there are no subscribers
        let _ = self.tx.send(event);
    }
}
