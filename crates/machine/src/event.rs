use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendo_core::{ItemId, Money, TransactionId};
use vendo_events::Event;

/// Event: ItemRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRegistered {
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdded {
    pub item_id: ItemId,
    pub quantity: u32,
    pub available: u32,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemSelected (first selection or re-selection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSelected {
    pub transaction_id: TransactionId,
    pub item_id: ItemId,
    pub price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentTendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTendered {
    pub transaction_id: TransactionId,
    pub amount: Money,
    pub total: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentCompleted (tendered total reached the price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCompleted {
    pub transaction_id: TransactionId,
    pub total: Money,
    pub price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemDispensed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDispensed {
    pub transaction_id: TransactionId,
    pub item_id: ItemId,
    pub price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DispenseFailed (stock vanished between selection and dispense).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispenseFailed {
    pub transaction_id: TransactionId,
    pub item_id: ItemId,
    pub refunded: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionSettled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSettled {
    pub transaction_id: TransactionId,
    pub change: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TransactionCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCancelled {
    pub transaction_id: TransactionId,
    pub refunded: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RevenueCollected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueCollected {
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineEvent {
    ItemRegistered(ItemRegistered),
    StockAdded(StockAdded),
    ItemSelected(ItemSelected),
    PaymentTendered(PaymentTendered),
    PaymentCompleted(PaymentCompleted),
    ItemDispensed(ItemDispensed),
    DispenseFailed(DispenseFailed),
    TransactionSettled(TransactionSettled),
    TransactionCancelled(TransactionCancelled),
    RevenueCollected(RevenueCollected),
}

impl MachineEvent {
    /// Transaction the event belongs to, if any.
    pub fn transaction_id(&self) -> Option<TransactionId> {
        match self {
            MachineEvent::ItemSelected(e) => Some(e.transaction_id),
            MachineEvent::PaymentTendered(e) => Some(e.transaction_id),
            MachineEvent::PaymentCompleted(e) => Some(e.transaction_id),
            MachineEvent::ItemDispensed(e) => Some(e.transaction_id),
            MachineEvent::DispenseFailed(e) => Some(e.transaction_id),
            MachineEvent::TransactionSettled(e) => Some(e.transaction_id),
            MachineEvent::TransactionCancelled(e) => Some(e.transaction_id),
            MachineEvent::ItemRegistered(_)
            | MachineEvent::StockAdded(_)
            | MachineEvent::RevenueCollected(_) => None,
        }
    }
}

impl Event for MachineEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MachineEvent::ItemRegistered(_) => "machine.item.registered",
            MachineEvent::StockAdded(_) => "machine.item.stock_added",
            MachineEvent::ItemSelected(_) => "machine.transaction.item_selected",
            MachineEvent::PaymentTendered(_) => "machine.transaction.payment_tendered",
            MachineEvent::PaymentCompleted(_) => "machine.transaction.payment_completed",
            MachineEvent::ItemDispensed(_) => "machine.transaction.item_dispensed",
            MachineEvent::DispenseFailed(_) => "machine.transaction.dispense_failed",
            MachineEvent::TransactionSettled(_) => "machine.transaction.settled",
            MachineEvent::TransactionCancelled(_) => "machine.transaction.cancelled",
            MachineEvent::RevenueCollected(_) => "machine.revenue.collected",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MachineEvent::ItemRegistered(e) => e.occurred_at,
            MachineEvent::StockAdded(e) => e.occurred_at,
            MachineEvent::ItemSelected(e) => e.occurred_at,
            MachineEvent::PaymentTendered(e) => e.occurred_at,
            MachineEvent::PaymentCompleted(e) => e.occurred_at,
            MachineEvent::ItemDispensed(e) => e.occurred_at,
            MachineEvent::DispenseFailed(e) => e.occurred_at,
            MachineEvent::TransactionSettled(e) => e.occurred_at,
            MachineEvent::TransactionCancelled(e) => e.occurred_at,
            MachineEvent::RevenueCollected(e) => e.occurred_at,
        }
    }
}
