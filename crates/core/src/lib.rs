//! `vendo-core`: vending domain building blocks.
//!
//! This crate contains **pure domain** primitives shared by the inventory,
//! payment and machine crates (no locking, no IO).

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod state;
pub mod value_object;

pub use entity::Entity;
pub use error::{VendingError, VendingResult};
pub use id::{ItemId, MachineId, TransactionId};
pub use money::Money;
pub use state::{MachineState, Operation};
pub use value_object::ValueObject;
