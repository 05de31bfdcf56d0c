use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use vendo_core::{ItemId, VendingError, VendingResult};

/// Available count of one item at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub item_id: ItemId,
    pub available: u32,
}

/// Per-item stock counts.
///
/// Counts are unsigned and only ever decremented through
/// [`decrement_if_available`](Self::decrement_if_available), so they cannot go
/// negative under any interleaving.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    counts: Mutex<HashMap<ItemId, u32>>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    // Every mutation is a single map write, so a guard recovered from a
    // poisoned lock still sees consistent counts.
    fn counts(&self) -> MutexGuard<'_, HashMap<ItemId, u32>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `qty` units of `item_id`, creating the entry at 0 if absent.
    ///
    /// Returns the new count. Adding 0 registers the item without stock.
    pub fn add(&self, item_id: &ItemId, qty: u32) -> VendingResult<u32> {
        let mut counts = self.counts();
        let current = counts.get(item_id).copied().unwrap_or(0);
        let updated = current.checked_add(qty).ok_or_else(|| {
            VendingError::validation(format!("stock for {item_id} would overflow"))
        })?;
        counts.insert(item_id.clone(), updated);

        debug!(item_id = %item_id, qty, available = updated, "stock added");
        Ok(updated)
    }

    /// Atomically take one unit if any is available.
    ///
    /// Returns `false` (and leaves the count untouched) when the item is unknown
    /// or its count is zero.
    pub fn decrement_if_available(&self, item_id: &ItemId) -> bool {
        let mut counts = self.counts();
        match counts.get_mut(item_id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                debug!(item_id = %item_id, available = *count, "stock decremented");
                true
            }
            _ => false,
        }
    }

    /// Available count, 0 if the item is unknown.
    pub fn available(&self, item_id: &ItemId) -> u32 {
        self.counts().get(item_id).copied().unwrap_or(0)
    }

    pub fn is_available(&self, item_id: &ItemId) -> bool {
        self.available(item_id) > 0
    }

    /// Copy of every count, sorted by item id.
    pub fn snapshot(&self) -> Vec<StockLevel> {
        let counts = self.counts();
        let mut levels: Vec<StockLevel> = counts
            .iter()
            .map(|(item_id, available)| StockLevel {
                item_id: item_id.clone(),
                available: *available,
            })
            .collect();
        levels.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        levels
    }

    /// Items whose count is strictly below `threshold`, sorted by id.
    pub fn below(&self, threshold: u32) -> Vec<ItemId> {
        self.snapshot()
            .into_iter()
            .filter(|level| level.available < threshold)
            .map(|level| level.item_id)
            .collect()
    }
}
