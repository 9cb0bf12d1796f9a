use indexmap::IndexMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::state::{countdown::Countdown, ledger::PlacementLedger};

/// Default countdown length for one session, in seconds.
pub const SESSION_DURATION_SECS: u32 = 180;

/// A draggable label that belongs to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Identifier unique within the catalog.
    pub id: u32,
    /// Text shown on the draggable bubble.
    pub label: String,
    /// Category of the bucket this item must be dropped into.
    pub correct_category: String,
}

/// A drop target identified by its category label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Category label compared against [`Item::correct_category`].
    pub category: String,
}

/// Recorded assignment of one item to one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Item that was dropped.
    pub item_id: u32,
    /// Category of the bucket it landed in.
    pub placed_category: String,
    /// Whether the bucket matched the item's category when it was placed.
    pub is_correct: bool,
}

/// Immutable item and bucket set for every session served by the process.
#[derive(Debug, Clone)]
pub struct Catalog {
    items: IndexMap<u32, Item>,
    buckets: Vec<Bucket>,
}

impl Catalog {
    /// Build a catalog, keeping the first definition when an item id repeats.
    pub fn new(items: Vec<Item>, buckets: Vec<Bucket>) -> Self {
        let mut by_id = IndexMap::with_capacity(items.len());
        for item in items {
            by_id.entry(item.id).or_insert(item);
        }
        Self {
            items: by_id,
            buckets,
        }
    }

    /// Look up an item by identifier.
    pub fn item(&self, id: u32) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Items in their configured order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Buckets in their configured order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Whether a bucket with the given category exists.
    pub fn has_bucket(&self, category: &str) -> bool {
        self.buckets.iter().any(|bucket| bucket.category == category)
    }

    /// Number of items a session has to place.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog holds no items at all.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Why the playing phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    /// Every item received a placement.
    AllPlaced,
    /// The countdown reached zero.
    TimeUp,
}

/// All mutable data of one player's run, owned by the game controller.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Identifier allocated when the player submits their email.
    pub id: Option<Uuid>,
    /// Email the results are submitted for.
    pub email: Option<String>,
    /// Moment the playing phase started.
    pub start_time: Option<OffsetDateTime>,
    /// Moment the results phase was entered.
    pub end_time: Option<OffsetDateTime>,
    /// Countdown backing `time_remaining`.
    pub countdown: Countdown,
    /// Placements made so far.
    pub ledger: PlacementLedger,
    /// Running score shown while playing (one point per correct placement).
    pub score: u32,
    /// Weighted 0-10 score computed on entering results.
    pub final_score: Option<f64>,
    /// Set by the first end-of-game trigger; later triggers are ignored.
    pub ended: bool,
    /// Trigger that ended the session.
    pub finish_reason: Option<FinishReason>,
}

impl GameSession {
    /// Fresh first-load session for a countdown of `duration_secs`.
    pub fn new(duration_secs: u32) -> Self {
        Self {
            id: None,
            email: None,
            start_time: None,
            end_time: None,
            countdown: Countdown::new(duration_secs),
            ledger: PlacementLedger::default(),
            score: 0,
            final_score: None,
            ended: false,
            finish_reason: None,
        }
    }

    /// Seconds left on the countdown.
    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    /// Number of correct placements.
    pub fn correct_count(&self) -> u32 {
        self.ledger.correct_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, category: &str) -> Item {
        Item {
            id,
            label: format!("item {id}"),
            correct_category: category.into(),
        }
    }

    #[test]
    fn catalog_keeps_first_definition_of_duplicate_ids() {
        let catalog = Catalog::new(
            vec![item(1, "GROWTH"), item(1, "PAYMENTS"), item(2, "INVENTORY")],
            vec![],
        );
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.item(1).unwrap().correct_category, "GROWTH");
    }

    #[test]
    fn fresh_session_starts_with_full_timer() {
        let session = GameSession::new(SESSION_DURATION_SECS);
        assert_eq!(session.time_remaining(), 180);
        assert_eq!(session.correct_count(), 0);
        assert!(session.email.is_none());
        assert!(!session.ended);
    }
}
