//! At-most-once placement bookkeeping for draggable items.

use indexmap::IndexMap;

use crate::state::game::{Item, Placement};

/// Result of offering a drop to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceOutcome {
    /// Whether a new placement was recorded.
    pub accepted: bool,
    /// Whether the recorded placement matched the item's category.
    pub is_correct: bool,
}

impl PlaceOutcome {
    const REJECTED: Self = Self {
        accepted: false,
        is_correct: false,
    };
}

/// Placements keyed by item id, in the order they were made.
#[derive(Debug, Clone, Default)]
pub struct PlacementLedger {
    placements: IndexMap<u32, Placement>,
    correct: u32,
}

impl PlacementLedger {
    /// Record `item` in `target_category` unless it already has a placement.
    pub fn place(&mut self, item: &Item, target_category: &str) -> PlaceOutcome {
        if self.placements.contains_key(&item.id) {
            return PlaceOutcome::REJECTED;
        }

        let is_correct = item.correct_category == target_category;
        self.placements.insert(
            item.id,
            Placement {
                item_id: item.id,
                placed_category: target_category.to_string(),
                is_correct,
            },
        );
        if is_correct {
            self.correct += 1;
        }

        PlaceOutcome {
            accepted: true,
            is_correct,
        }
    }

    /// Placement recorded for `item_id`, if any.
    pub fn get(&self, item_id: u32) -> Option<&Placement> {
        self.placements.get(&item_id)
    }

    /// Whether `item_id` already has a placement.
    pub fn contains(&self, item_id: u32) -> bool {
        self.placements.contains_key(&item_id)
    }

    /// All placements in drop order.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.placements.values()
    }

    /// Number of placements recorded.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether nothing has been placed yet.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Number of placements that matched their item's category.
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    /// Whether every one of `total_items` has been placed.
    pub fn is_complete(&self, total_items: usize) -> bool {
        total_items > 0 && self.placements.len() >= total_items
    }
}
