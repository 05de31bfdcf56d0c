//! Vending machine: a transactional state machine over an inventory ledger
//! and a payment accumulator.
//!
//! The machine is constructed explicitly and owned by its caller; there is no
//! global instance. Share it across threads with an `Arc`.

pub mod config;
pub mod event;
pub mod machine;

pub use config::MachineConfig;
pub use event::MachineEvent;
pub use machine::{MachineEnvelope, ProductListing, VendingMachine};

pub use vendo_core::{ItemId, MachineState, Money, Operation, VendingError, VendingResult};
pub use vendo_inventory::{InventoryLedger, Item};
pub use vendo_payments::{Coin, Note};
