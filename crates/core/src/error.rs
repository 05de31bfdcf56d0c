//! Vending error model.

use thiserror::Error;

use crate::id::ItemId;
use crate::money::Money;
use crate::state::{MachineState, Operation};

/// Result type used across the vending crates.
pub type VendingResult<T> = Result<T, VendingError>;

/// Vending-level error.
///
/// Every variant is returned to the caller; none is fatal and none is retried
/// internally. The machine is left either unchanged or back in `Idle`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VendingError {
    /// The item has no stock left.
    ///
    /// `refunded` is the payment handed back when the failure aborted an
    /// in-flight transaction (zero when raised at selection time).
    #[error("item {item_id} is out of stock (refunded {refunded})")]
    OutOfStock { item_id: ItemId, refunded: Money },

    /// A tendered amount was zero or overflowed the accumulator.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The operation is not legal in the machine's current state.
    #[error("cannot {operation} while {state}")]
    InvalidOperationForState {
        state: MachineState,
        operation: Operation,
    },

    /// The item identifier is not in the catalog.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// A value failed validation (e.g. malformed money string).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Internal failure (e.g. a poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl VendingError {
    pub fn out_of_stock(item_id: ItemId) -> Self {
        Self::OutOfStock {
            item_id,
            refunded: Money::ZERO,
        }
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    pub fn invalid_operation(state: MachineState, operation: Operation) -> Self {
        Self::InvalidOperationForState { state, operation }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
