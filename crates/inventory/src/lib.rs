//! Inventory domain module.
//!
//! Catalog items and the stock ledger. The ledger owns its own lock so that
//! check-and-decrement stays atomic even when several owners share it.

pub mod item;
pub mod ledger;

pub use item::Item;
pub use ledger::{InventoryLedger, StockLevel};
