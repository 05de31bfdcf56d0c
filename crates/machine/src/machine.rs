//! The vending state machine.
//!
//! ```text
//!            select                    tender (total >= price)
//!   Idle ─────────────▶ AwaitingPayment ───────────────────────▶ Dispensing
//!    ▲                  │   ▲     │                              │       │
//!    │       cancel     │   └─────┘ select / tender              │       │ dispense
//!    ├──────────────────┘                                        │       ▼
//!    │                      settle (after dispense)              │   (dispensed)
//!    ├───────────────────────────────────────────────────────────┘       │
//!    └─────────── dispense fails (stock gone): refund ◀──────────────────┘
//! ```
//!
//! Every operation runs under one lock, so concurrent callers are serialized
//! and never observe a half-applied transition.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use vendo_core::{
    ItemId, MachineId, MachineState, Money, Operation, TransactionId, VendingError, VendingResult,
};
use vendo_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use vendo_inventory::{InventoryLedger, Item};
use vendo_payments::{Coin, Note, PaymentAccumulator};

use crate::config::MachineConfig;
use crate::event::{
    DispenseFailed, ItemDispensed, ItemRegistered, ItemSelected, MachineEvent, PaymentCompleted,
    PaymentTendered, RevenueCollected, StockAdded, TransactionCancelled, TransactionSettled,
};

/// Journal entry emitted by a machine.
pub type MachineEnvelope = EventEnvelope<MachineEvent>;

/// One catalog row: item, price and current stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductListing {
    pub item_id: ItemId,
    pub name: String,
    pub price: Money,
    pub available: u32,
}

#[derive(Debug, Clone)]
struct Transaction {
    id: TransactionId,
    item: Item,
    payment: PaymentAccumulator,
    dispensed: bool,
}

impl Transaction {
    fn new(item: Item) -> Self {
        Self {
            id: TransactionId::new(),
            item,
            payment: PaymentAccumulator::new(),
            dispensed: false,
        }
    }

    fn is_paid(&self) -> bool {
        self.payment.total() >= self.item.price()
    }
}

#[derive(Debug, Default)]
enum Phase {
    #[default]
    Idle,
    AwaitingPayment(Transaction),
    Dispensing(Transaction),
}

impl Phase {
    fn state(&self) -> MachineState {
        match self {
            Phase::Idle => MachineState::Idle,
            Phase::AwaitingPayment(_) => MachineState::AwaitingPayment,
            Phase::Dispensing(_) => MachineState::Dispensing,
        }
    }

    fn transaction(&self) -> Option<&Transaction> {
        match self {
            Phase::Idle => None,
            Phase::AwaitingPayment(tx) | Phase::Dispensing(tx) => Some(tx),
        }
    }

    /// Leave the phase `Idle` and hand back the transaction it held.
    fn take_transaction(&mut self) -> Option<Transaction> {
        match std::mem::take(self) {
            Phase::Idle => None,
            Phase::AwaitingPayment(tx) | Phase::Dispensing(tx) => Some(tx),
        }
    }

    /// AwaitingPayment → Dispensing once the transaction is fully paid.
    ///
    /// Returns `true` when the transition happened.
    fn promote_if_paid(&mut self) -> bool {
        match std::mem::take(self) {
            Phase::AwaitingPayment(tx) if tx.is_paid() => {
                *self = Phase::Dispensing(tx);
                true
            }
            other => {
                *self = other;
                false
            }
        }
    }
}

#[derive(Debug, Default)]
struct MachineInner {
    catalog: HashMap<ItemId, Item>,
    phase: Phase,
    revenue: Money,
    journal: Vec<MachineEnvelope>,
}

/// A single vending machine.
///
/// Owned by its caller (wrap it in an `Arc` to share across threads). The
/// inventory ledger is injected so it can be inspected or shared.
#[derive(Debug)]
pub struct VendingMachine {
    id: MachineId,
    config: MachineConfig,
    ledger: Arc<InventoryLedger>,
    inner: Mutex<MachineInner>,
    bus: InMemoryEventBus<MachineEnvelope>,
}

impl VendingMachine {
    pub fn new(config: MachineConfig, ledger: Arc<InventoryLedger>) -> Self {
        let id = MachineId::new();
        info!(machine = %config.name, machine_id = %id, "vending machine created");
        Self {
            id,
            config,
            ledger,
            inner: Mutex::new(MachineInner::default()),
            bus: InMemoryEventBus::new(),
        }
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Arc<InventoryLedger> {
        &self.ledger
    }

    fn lock(&self) -> VendingResult<MutexGuard<'_, MachineInner>> {
        self.inner
            .lock()
            .map_err(|_| VendingError::internal("machine lock poisoned"))
    }

    fn record(&self, inner: &mut MachineInner, event: MachineEvent) {
        let sequence_number = inner.journal.len() as u64 + 1;
        let envelope = EventEnvelope::new(Uuid::now_v7(), self.id, sequence_number, event);
        inner.journal.push(envelope.clone());

        if let Err(e) = self.bus.publish(envelope) {
            warn!(machine = %self.config.name, error = ?e, "failed to publish machine event");
        }
    }

    // ---------------------------------------------------------------------
    // Catalog and stock
    // ---------------------------------------------------------------------

    /// Add an item to the catalog. Its ledger entry is created at 0.
    pub fn register_item(&self, item: Item) -> VendingResult<()> {
        let mut inner = self.lock()?;
        if inner.catalog.contains_key(item.item_id()) {
            return Err(VendingError::validation(format!(
                "item {} is already registered",
                item.item_id()
            )));
        }

        self.ledger.add(item.item_id(), 0)?;
        info!(
            machine = %self.config.name,
            item_id = %item.item_id(),
            price = %item.price(),
            "item registered"
        );

        let event = MachineEvent::ItemRegistered(ItemRegistered {
            item_id: item.item_id().clone(),
            name: item.name().to_string(),
            price: item.price(),
            occurred_at: Utc::now(),
        });
        inner.catalog.insert(item.item_id().clone(), item);
        self.record(&mut inner, event);
        Ok(())
    }

    /// Replenish stock for a catalog item. Allowed in every state.
    ///
    /// Returns the new available count.
    pub fn add_stock(&self, item_id: &ItemId, quantity: u32) -> VendingResult<u32> {
        let mut inner = self.lock()?;
        if !inner.catalog.contains_key(item_id) {
            return Err(VendingError::ItemNotFound(item_id.clone()));
        }

        let available = self.ledger.add(item_id, quantity)?;
        info!(machine = %self.config.name, item_id = %item_id, quantity, available, "stock added");

        self.record(
            &mut inner,
            MachineEvent::StockAdded(StockAdded {
                item_id: item_id.clone(),
                quantity,
                available,
                occurred_at: Utc::now(),
            }),
        );
        Ok(available)
    }

    /// Catalog listing sorted by item id.
    pub fn products(&self) -> VendingResult<Vec<ProductListing>> {
        let inner = self.lock()?;
        let mut listings: Vec<ProductListing> = inner
            .catalog
            .values()
            .map(|item| ProductListing {
                item_id: item.item_id().clone(),
                name: item.name().to_string(),
                price: item.price(),
                available: self.ledger.available(item.item_id()),
            })
            .collect();
        listings.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Ok(listings)
    }

    /// Catalog items with fewer units than the configured threshold, sorted
    /// by id. Ledger entries owned by other machines are skipped.
    pub fn low_stock(&self) -> VendingResult<Vec<ItemId>> {
        let inner = self.lock()?;
        Ok(self
            .ledger
            .below(self.config.low_stock_threshold)
            .into_iter()
            .filter(|item_id| inner.catalog.contains_key(item_id))
            .collect())
    }

    // ---------------------------------------------------------------------
    // Transaction flow
    // ---------------------------------------------------------------------

    /// Select (or re-select) an item.
    ///
    /// Legal in `Idle` and `AwaitingPayment`. Re-selection keeps the payment
    /// already tendered; if it covers the new price the machine moves
    /// straight to `Dispensing`.
    pub fn select(&self, item_id: &ItemId) -> VendingResult<MachineState> {
        let mut inner = self.lock()?;
        let state = inner.phase.state();
        if state == MachineState::Dispensing {
            return Err(VendingError::invalid_operation(state, Operation::Select));
        }

        let item = inner
            .catalog
            .get(item_id)
            .cloned()
            .ok_or_else(|| VendingError::ItemNotFound(item_id.clone()))?;

        if !self.ledger.is_available(item_id) {
            debug!(machine = %self.config.name, item_id = %item_id, %state, "selection rejected: out of stock");
            return Err(VendingError::out_of_stock(item_id.clone()));
        }

        let price = item.price();
        let transaction_id = if let Phase::AwaitingPayment(tx) = &mut inner.phase {
            tx.item = item;
            tx.id
        } else {
            let tx = Transaction::new(item);
            let id = tx.id;
            inner.phase = Phase::AwaitingPayment(tx);
            id
        };

        let now = Utc::now();
        self.record(
            &mut inner,
            MachineEvent::ItemSelected(ItemSelected {
                transaction_id,
                item_id: item_id.clone(),
                price,
                occurred_at: now,
            }),
        );
        self.complete_payment_if_paid(&mut inner, now);

        let next = inner.phase.state();
        info!(machine = %self.config.name, item_id = %item_id, %price, state = %next, "item selected");
        Ok(next)
    }

    /// Tender payment toward the selected item.
    ///
    /// Legal only in `AwaitingPayment`. Reaching the price moves the machine
    /// to `Dispensing`.
    pub fn tender(&self, amount: Money) -> VendingResult<MachineState> {
        let mut inner = self.lock()?;
        let state = inner.phase.state();
        let Phase::AwaitingPayment(tx) = &mut inner.phase else {
            return Err(VendingError::invalid_operation(state, Operation::Tender));
        };

        let total = tx.payment.tender(amount)?;
        let transaction_id = tx.id;

        let now = Utc::now();
        self.record(
            &mut inner,
            MachineEvent::PaymentTendered(PaymentTendered {
                transaction_id,
                amount,
                total,
                occurred_at: now,
            }),
        );
        self.complete_payment_if_paid(&mut inner, now);

        let next = inner.phase.state();
        info!(machine = %self.config.name, %amount, %total, state = %next, "payment tendered");
        Ok(next)
    }

    pub fn tender_coin(&self, coin: Coin) -> VendingResult<MachineState> {
        self.tender(coin.value())
    }

    pub fn tender_note(&self, note: Note) -> VendingResult<MachineState> {
        self.tender(note.value())
    }

    fn complete_payment_if_paid(&self, inner: &mut MachineInner, now: DateTime<Utc>) {
        if !inner.phase.promote_if_paid() {
            return;
        }
        if let Some(tx) = inner.phase.transaction() {
            let event = MachineEvent::PaymentCompleted(PaymentCompleted {
                transaction_id: tx.id,
                total: tx.payment.total(),
                price: tx.item.price(),
                occurred_at: now,
            });
            self.record(inner, event);
        }
    }

    /// Release the selected item and book its price as revenue.
    ///
    /// Legal once per transaction in `Dispensing`. If the stock is gone by
    /// now the transaction is aborted: the machine returns to `Idle`, nothing
    /// is charged and the error carries the refunded payment.
    pub fn dispense(&self) -> VendingResult<Item> {
        let mut inner = self.lock()?;
        let state = inner.phase.state();
        let (transaction_id, item, tendered) = match &inner.phase {
            Phase::Dispensing(tx) if !tx.dispensed => (tx.id, tx.item.clone(), tx.payment.total()),
            _ => return Err(VendingError::invalid_operation(state, Operation::Dispense)),
        };

        let price = item.price();
        let revenue = inner
            .revenue
            .checked_add(price)
            .ok_or_else(|| VendingError::internal("collected revenue would overflow"))?;

        if !self.ledger.decrement_if_available(item.item_id()) {
            let refunded = inner
                .phase
                .take_transaction()
                .map(|mut tx| tx.payment.reset())
                .unwrap_or(tendered);
            warn!(
                machine = %self.config.name,
                item_id = %item.item_id(),
                %refunded,
                "dispense failed: out of stock, transaction aborted"
            );
            self.record(
                &mut inner,
                MachineEvent::DispenseFailed(DispenseFailed {
                    transaction_id,
                    item_id: item.item_id().clone(),
                    refunded,
                    occurred_at: Utc::now(),
                }),
            );
            return Err(VendingError::OutOfStock {
                item_id: item.item_id().clone(),
                refunded,
            });
        }

        inner.revenue = revenue;
        if let Phase::Dispensing(tx) = &mut inner.phase {
            tx.dispensed = true;
        }

        info!(machine = %self.config.name, item_id = %item.item_id(), %price, "item dispensed");
        self.record(
            &mut inner,
            MachineEvent::ItemDispensed(ItemDispensed {
                transaction_id,
                item_id: item.item_id().clone(),
                price,
                occurred_at: Utc::now(),
            }),
        );
        Ok(item)
    }

    /// Finish a dispensed purchase and return the change.
    pub fn settle(&self) -> VendingResult<Money> {
        let mut inner = self.lock()?;
        let state = inner.phase.state();
        let change = match &inner.phase {
            Phase::Dispensing(tx) if tx.dispensed => tx
                .payment
                .total()
                .checked_sub(tx.item.price())
                .ok_or_else(|| VendingError::internal("tendered amount below price"))?,
            _ => return Err(VendingError::invalid_operation(state, Operation::Settle)),
        };

        let Some(mut tx) = inner.phase.take_transaction() else {
            return Err(VendingError::invalid_operation(state, Operation::Settle));
        };
        tx.payment.reset();

        info!(machine = %self.config.name, transaction_id = %tx.id, %change, "transaction settled");
        self.record(
            &mut inner,
            MachineEvent::TransactionSettled(TransactionSettled {
                transaction_id: tx.id,
                change,
                occurred_at: Utc::now(),
            }),
        );
        Ok(change)
    }

    /// Abort the transaction and return everything tendered so far.
    pub fn cancel(&self) -> VendingResult<Money> {
        let mut inner = self.lock()?;
        let state = inner.phase.state();
        if state != MachineState::AwaitingPayment {
            return Err(VendingError::invalid_operation(state, Operation::Cancel));
        }
        let Some(mut tx) = inner.phase.take_transaction() else {
            return Err(VendingError::invalid_operation(state, Operation::Cancel));
        };
        let refunded = tx.payment.reset();

        info!(machine = %self.config.name, transaction_id = %tx.id, %refunded, "transaction cancelled");
        self.record(
            &mut inner,
            MachineEvent::TransactionCancelled(TransactionCancelled {
                transaction_id: tx.id,
                refunded,
                occurred_at: Utc::now(),
            }),
        );
        Ok(refunded)
    }

    // ---------------------------------------------------------------------
    // Views, revenue and events
    // ---------------------------------------------------------------------

    pub fn state(&self) -> VendingResult<MachineState> {
        Ok(self.lock()?.phase.state())
    }

    pub fn selected_item(&self) -> VendingResult<Option<Item>> {
        Ok(self.lock()?.phase.transaction().map(|tx| tx.item.clone()))
    }

    /// Amount tendered in the current transaction (zero when idle).
    pub fn tendered(&self) -> VendingResult<Money> {
        Ok(self
            .lock()?
            .phase
            .transaction()
            .map(|tx| tx.payment.total())
            .unwrap_or(Money::ZERO))
    }

    pub fn collected_revenue(&self) -> VendingResult<Money> {
        Ok(self.lock()?.revenue)
    }

    /// Withdraw the collected revenue, leaving zero behind.
    pub fn collect_revenue(&self) -> VendingResult<Money> {
        let mut inner = self.lock()?;
        let amount = std::mem::take(&mut inner.revenue);

        info!(machine = %self.config.name, %amount, "revenue collected");
        self.record(
            &mut inner,
            MachineEvent::RevenueCollected(RevenueCollected {
                amount,
                occurred_at: Utc::now(),
            }),
        );
        Ok(amount)
    }

    /// Subscribe to every event recorded from now on.
    pub fn subscribe(&self) -> Subscription<MachineEnvelope> {
        self.bus.subscribe()
    }

    /// Every event recorded so far, in order.
    ///
    /// The journal lives in memory for the life of the machine and is never
    /// compacted. Use [`journal_since`](Self::journal_since) to poll for new
    /// entries without copying the whole history.
    pub fn journal(&self) -> VendingResult<Vec<MachineEnvelope>> {
        self.journal_since(0)
    }

    /// Events with a sequence number greater than `sequence_number`.
    pub fn journal_since(&self, sequence_number: u64) -> VendingResult<Vec<MachineEnvelope>> {
        let inner = self.lock()?;
        // Sequence numbers start at 1 and match journal positions.
        let start = usize::try_from(sequence_number)
            .unwrap_or(usize::MAX)
            .min(inner.journal.len());
        Ok(inner.journal[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendo_events::Event;

    fn item_id(code: &str) -> ItemId {
        ItemId::new(code).unwrap()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    /// Machine with A1 "Cola" at 3.50 (stock 5) and B1 "Chips" at 5.00 (stock 0).
    fn test_machine() -> VendingMachine {
        let machine = VendingMachine::new(MachineConfig::default(), Arc::new(InventoryLedger::new()));
        machine
            .register_item(Item::new(item_id("A1"), "Cola", money("3.50")).unwrap())
            .unwrap();
        machine
            .register_item(Item::new(item_id("B1"), "Chips", money("5.00")).unwrap())
            .unwrap();
        machine.add_stock(&item_id("A1"), 5).unwrap();
        machine
    }

    fn expect_invalid_op(err: VendingError, state: MachineState, operation: Operation) {
        match err {
            VendingError::InvalidOperationForState { state: s, operation: o }
                if s == state && o == operation => {}
            other => panic!("Expected InvalidOperationForState({state}, {operation}), got {other:?}"),
        }
    }

    #[test]
    fn new_machine_is_idle_with_no_revenue() {
        let machine = test_machine();
        assert_eq!(machine.state().unwrap(), MachineState::Idle);
        assert_eq!(machine.collected_revenue().unwrap(), Money::ZERO);
        assert_eq!(machine.tendered().unwrap(), Money::ZERO);
        assert!(machine.selected_item().unwrap().is_none());
    }

    #[test]
    fn select_moves_idle_to_awaiting_payment() {
        let machine = test_machine();
        let state = machine.select(&item_id("A1")).unwrap();
        assert_eq!(state, MachineState::AwaitingPayment);
        assert_eq!(machine.selected_item().unwrap().unwrap().name(), "Cola");
    }

    #[test]
    fn select_unknown_item_is_not_found() {
        let machine = test_machine();
        let err = machine.select(&item_id("Z9")).unwrap_err();
        assert_eq!(err, VendingError::ItemNotFound(item_id("Z9")));
        assert_eq!(machine.state().unwrap(), MachineState::Idle);
    }

    #[test]
    fn select_out_of_stock_keeps_idle() {
        let machine = test_machine();
        let err = machine.select(&item_id("B1")).unwrap_err();
        assert_eq!(err, VendingError::out_of_stock(item_id("B1")));
        assert_eq!(machine.state().unwrap(), MachineState::Idle);
    }

    #[test]
    fn reselect_keeps_payment_and_switches_item() {
        let machine = test_machine();
        machine.add_stock(&item_id("B1"), 1).unwrap();
        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("1.00")).unwrap();

        let state = machine.select(&item_id("B1")).unwrap();
        assert_eq!(state, MachineState::AwaitingPayment);
        assert_eq!(machine.tendered().unwrap(), money("1.00"));
        assert_eq!(machine.selected_item().unwrap().unwrap().item_id(), &item_id("B1"));
    }

    #[test]
    fn reselect_out_of_stock_keeps_previous_selection() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("0.50")).unwrap();

        let err = machine.select(&item_id("B1")).unwrap_err();
        assert!(matches!(err, VendingError::OutOfStock { .. }));
        assert_eq!(machine.state().unwrap(), MachineState::AwaitingPayment);
        assert_eq!(machine.selected_item().unwrap().unwrap().item_id(), &item_id("A1"));
        assert_eq!(machine.tendered().unwrap(), money("0.50"));
    }

    #[test]
    fn reselect_cheaper_item_with_enough_payment_goes_to_dispensing() {
        let machine = test_machine();
        machine.add_stock(&item_id("B1"), 1).unwrap();
        machine.select(&item_id("B1")).unwrap();
        machine.tender(money("4.00")).unwrap();

        let state = machine.select(&item_id("A1")).unwrap();
        assert_eq!(state, MachineState::Dispensing);
    }

    #[test]
    fn tender_reaching_price_moves_to_dispensing() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();

        assert_eq!(machine.tender(money("3.00")).unwrap(), MachineState::AwaitingPayment);
        assert_eq!(machine.tender(money("0.50")).unwrap(), MachineState::Dispensing);
    }

    #[test]
    fn tender_zero_is_invalid_amount_and_keeps_state() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        let err = machine.tender(Money::ZERO).unwrap_err();
        assert!(matches!(err, VendingError::InvalidAmount(_)));
        assert_eq!(machine.state().unwrap(), MachineState::AwaitingPayment);
    }

    #[test]
    fn tender_by_denomination() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        machine.tender_coin(Coin::Quarter).unwrap();
        machine.tender_note(Note::One).unwrap();
        assert_eq!(machine.tendered().unwrap(), money("1.25"));
    }

    #[test]
    fn operations_rejected_in_idle() {
        let machine = test_machine();
        expect_invalid_op(machine.tender(money("1")).unwrap_err(), MachineState::Idle, Operation::Tender);
        expect_invalid_op(machine.dispense().unwrap_err(), MachineState::Idle, Operation::Dispense);
        expect_invalid_op(machine.settle().unwrap_err(), MachineState::Idle, Operation::Settle);
        expect_invalid_op(machine.cancel().unwrap_err(), MachineState::Idle, Operation::Cancel);
    }

    #[test]
    fn operations_rejected_in_awaiting_payment() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        let s = MachineState::AwaitingPayment;
        expect_invalid_op(machine.dispense().unwrap_err(), s, Operation::Dispense);
        expect_invalid_op(machine.settle().unwrap_err(), s, Operation::Settle);
    }

    #[test]
    fn operations_rejected_in_dispensing() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("5.00")).unwrap();
        let s = MachineState::Dispensing;
        expect_invalid_op(machine.select(&item_id("A1")).unwrap_err(), s, Operation::Select);
        expect_invalid_op(machine.tender(money("1")).unwrap_err(), s, Operation::Tender);
        expect_invalid_op(machine.cancel().unwrap_err(), s, Operation::Cancel);
        // Settling before the item is out is not allowed either.
        expect_invalid_op(machine.settle().unwrap_err(), s, Operation::Settle);
    }

    #[test]
    fn dispense_books_revenue_and_settle_returns_change() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("5.00")).unwrap();

        let item = machine.dispense().unwrap();
        assert_eq!(item.item_id(), &item_id("A1"));
        assert_eq!(machine.collected_revenue().unwrap(), money("3.50"));
        assert_eq!(machine.ledger().available(&item_id("A1")), 4);

        expect_invalid_op(machine.dispense().unwrap_err(), MachineState::Dispensing, Operation::Dispense);

        assert_eq!(machine.settle().unwrap(), money("1.50"));
        assert_eq!(machine.state().unwrap(), MachineState::Idle);
        assert_eq!(machine.tendered().unwrap(), Money::ZERO);
    }

    #[test]
    fn dispense_race_refunds_and_returns_to_idle() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("4.00")).unwrap();

        // Another owner of the shared ledger drains the stock.
        while machine.ledger().decrement_if_available(&item_id("A1")) {}

        let err = machine.dispense().unwrap_err();
        assert_eq!(
            err,
            VendingError::OutOfStock {
                item_id: item_id("A1"),
                refunded: money("4.00"),
            }
        );
        assert_eq!(machine.state().unwrap(), MachineState::Idle);
        assert_eq!(machine.collected_revenue().unwrap(), Money::ZERO);
    }

    #[test]
    fn cancel_refunds_everything_tendered() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("1.00")).unwrap();
        machine.tender(money("0.25")).unwrap();

        assert_eq!(machine.cancel().unwrap(), money("1.25"));
        assert_eq!(machine.state().unwrap(), MachineState::Idle);
        assert_eq!(machine.ledger().available(&item_id("A1")), 5);
    }

    #[test]
    fn add_stock_requires_catalog_item_and_works_in_any_state() {
        let machine = test_machine();
        let err = machine.add_stock(&item_id("Z9"), 1).unwrap_err();
        assert_eq!(err, VendingError::ItemNotFound(item_id("Z9")));

        machine.select(&item_id("A1")).unwrap();
        assert_eq!(machine.add_stock(&item_id("A1"), 2).unwrap(), 7);
        assert_eq!(machine.state().unwrap(), MachineState::AwaitingPayment);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let machine = test_machine();
        let err = machine
            .register_item(Item::new(item_id("A1"), "Other", money("1.00")).unwrap())
            .unwrap_err();
        assert!(matches!(err, VendingError::Validation(_)));
        assert_eq!(machine.products().unwrap()[0].name, "Cola");
    }

    #[test]
    fn products_and_low_stock() {
        let machine = test_machine();
        let products = machine.products().unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].item_id, item_id("A1"));
        assert_eq!(products[0].available, 5);
        assert_eq!(products[1].available, 0);

        assert_eq!(machine.low_stock().unwrap(), vec![item_id("B1")]);
    }

    #[test]
    fn collect_revenue_zeroes_total() {
        let machine = test_machine();
        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("3.50")).unwrap();
        machine.dispense().unwrap();
        machine.settle().unwrap();

        assert_eq!(machine.collect_revenue().unwrap(), money("3.50"));
        assert_eq!(machine.collected_revenue().unwrap(), Money::ZERO);
    }

    #[test]
    fn journal_records_purchase_in_order() {
        let machine = test_machine();
        let subscription = machine.subscribe();

        machine.select(&item_id("A1")).unwrap();
        machine.tender(money("3.50")).unwrap();
        machine.dispense().unwrap();
        machine.settle().unwrap();

        let received: Vec<&'static str> = subscription
            .drain()
            .iter()
            .map(|e| e.payload().event_type())
            .collect();
        assert_eq!(
            received,
            vec![
                "machine.transaction.item_selected",
                "machine.transaction.payment_tendered",
                "machine.transaction.payment_completed",
                "machine.transaction.item_dispensed",
                "machine.transaction.settled",
            ]
        );

        let journal = machine.journal().unwrap();
        let sequence: Vec<u64> = journal.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(sequence, (1..=journal.len() as u64).collect::<Vec<_>>());
        assert!(journal.iter().all(|e| e.machine_id() == machine.id()));

        let tx_ids: Vec<_> = journal
            .iter()
            .filter_map(|e| e.payload().transaction_id())
            .collect();
        assert_eq!(tx_ids.len(), 5);
        assert!(tx_ids.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn journal_since_returns_only_newer_entries() {
        let machine = test_machine();
        let seen = machine.journal().unwrap().len() as u64;

        machine.select(&item_id("A1")).unwrap();
        machine.cancel().unwrap();

        let newer = machine.journal_since(seen).unwrap();
        let sequence: Vec<u64> = newer.iter().map(|e| e.sequence_number()).collect();
        assert_eq!(sequence, vec![seen + 1, seen + 2]);
        assert!(matches!(newer[1].payload(), MachineEvent::TransactionCancelled(_)));

        assert!(machine.journal_since(seen + 2).unwrap().is_empty());
        assert!(machine.journal_since(u64::MAX).unwrap().is_empty());
    }

    #[test]
    fn low_stock_ignores_items_outside_the_catalog() {
        let ledger = Arc::new(InventoryLedger::new());
        ledger.add(&item_id("Z9"), 0).unwrap();

        let machine = VendingMachine::new(
            MachineConfig::default().with_low_stock_threshold(2),
            Arc::clone(&ledger),
        );
        machine
            .register_item(Item::new(item_id("A1"), "Cola", money("3.50")).unwrap())
            .unwrap();
        machine
            .register_item(Item::new(item_id("A2"), "Water", money("2.00")).unwrap())
            .unwrap();
        machine.add_stock(&item_id("A1"), 1).unwrap();
        machine.add_stock(&item_id("A2"), 2).unwrap();

        assert_eq!(machine.low_stock().unwrap(), vec![item_id("A1")]);
    }

    #[test]
    fn poisoned_machine_lock_surfaces_internal_error() {
        let machine = Arc::new(test_machine());
        let holder = Arc::clone(&machine);
        let outcome = std::thread::spawn(move || {
            let _guard = holder.inner.lock().unwrap();
            panic!("panicked while holding the machine lock");
        })
        .join();
        assert!(outcome.is_err());

        assert!(matches!(machine.state(), Err(VendingError::Internal(_))));
        assert!(matches!(
            machine.select(&item_id("A1")),
            Err(VendingError::Internal(_))
        ));
        assert!(matches!(machine.journal(), Err(VendingError::Internal(_))));
        // The ledger has its own lock and is untouched.
        assert_eq!(machine.ledger().available(&item_id("A1")), 5);
    }

    #[test]
    fn rejected_operations_are_not_journaled() {
        let machine = test_machine();
        let before = machine.journal().unwrap().len();

        let _ = machine.select(&item_id("B1"));
        let _ = machine.tender(money("1.00"));
        let _ = machine.dispense();

        assert_eq!(machine.journal().unwrap().len(), before);
    }
}
