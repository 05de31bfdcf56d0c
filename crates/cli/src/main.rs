//! Scripted walk through the vending machine: coin and note purchases, a
//! cancelled purchase, selling out, revenue collection and concurrent buyers.
//!
//! Pass `--journal` to print the machine's event journal as JSON at the end.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use anyhow::{Context, Result};
use tracing::{info, warn};

use vendo_machine::{
    Coin, InventoryLedger, Item, ItemId, MachineConfig, MachineState, Money, Note, VendingError,
    VendingMachine, VendingResult,
};

fn build_item(code: &str, name: &str, price: &str) -> Result<Item> {
    let id = ItemId::new(code)?;
    let price: Money = price.parse()?;
    Ok(Item::new(id, name, price)?)
}

fn show_products(machine: &VendingMachine) -> Result<()> {
    for p in machine.products()? {
        info!(item_id = %p.item_id, name = %p.name, price = %p.price, available = p.available, "product");
    }
    Ok(())
}

fn buy_with_coins(machine: &VendingMachine, cola: &ItemId) -> Result<()> {
    info!("purchase 1: cola with coins");
    machine.select(cola)?;
    for coin in [Coin::Dollar, Coin::Dollar, Coin::Dollar, Coin::Quarter, Coin::Quarter] {
        machine.tender_coin(coin)?;
    }
    machine.dispense()?;
    let change = machine.settle()?;
    info!(%change, "purchase complete");
    Ok(())
}

fn buy_with_note(machine: &VendingMachine, chocolate: &ItemId) -> Result<()> {
    info!("purchase 2: chocolate with a note");
    machine.select(chocolate)?;
    machine.tender_note(Note::Ten)?;
    machine.dispense()?;
    let change = machine.settle()?;
    info!(%change, "purchase complete");
    Ok(())
}

fn underpay_and_cancel(machine: &VendingMachine, chips: &ItemId) -> Result<()> {
    info!("purchase 3: not enough money");
    machine.select(chips)?;
    machine.tender_coin(Coin::Dollar)?;
    if let Err(e) = machine.dispense() {
        warn!(error = %e, "dispense refused");
    }
    let refunded = machine.cancel()?;
    info!(%refunded, "transaction cancelled");
    Ok(())
}

fn sell_out(machine: &VendingMachine, chocolate: &ItemId) -> Result<()> {
    info!("purchase 4: selling out");
    for _ in 0..3 {
        if let Err(e) = machine.select(chocolate) {
            warn!(error = %e, "selection refused");
            break;
        }
        machine.tender_note(Note::Ten)?;
        machine.dispense()?;
        machine.settle()?;
    }
    let low = machine.low_stock()?;
    info!(?low, "low stock after sell-out");
    Ok(())
}

/// Close out whatever transaction is still open, so no tendered money stays
/// inside the machine.
///
/// A fully paid transaction is dispensed and settled; a partly paid one is
/// cancelled. Returns the money handed back.
fn finish_open_transaction(machine: &VendingMachine) -> VendingResult<Money> {
    match machine.state()? {
        MachineState::Idle => Ok(Money::ZERO),
        MachineState::AwaitingPayment => machine.cancel(),
        MachineState::Dispensing => match machine.dispense() {
            Err(VendingError::OutOfStock { refunded, .. }) => Ok(refunded),
            // Already dispensed, only the change is left to hand out.
            Ok(_) | Err(VendingError::InvalidOperationForState { .. }) => machine.settle(),
            Err(e) => Err(e),
        },
    }
}

fn buy_water(machine: &VendingMachine, water: &ItemId) -> VendingResult<Money> {
    machine.select(water)?;
    machine.tender_coin(Coin::Dollar)?;
    machine.tender_coin(Coin::Dollar)?;
    machine.dispense()?;
    machine.settle()
}

fn concurrent_buyers(machine: &Arc<VendingMachine>, water: &ItemId) -> Result<()> {
    info!("purchase 5: concurrent buyers");
    machine.add_stock(water, 20)?;

    // The machine serializes single operations, not whole purchases. Buyers
    // queue at the session lock the way people queue at a real machine.
    let session = Mutex::new(());

    thread::scope(|scope| {
        for buyer in 0..5 {
            let machine = Arc::clone(machine);
            let session = &session;
            scope.spawn(move || {
                let _turn = session.lock().unwrap_or_else(PoisonError::into_inner);
                match buy_water(&machine, water) {
                    Ok(change) => info!(buyer, %change, "buyer succeeded"),
                    Err(e) => match finish_open_transaction(&machine) {
                        Ok(refund) => warn!(buyer, error = %e, %refund, "buyer interrupted"),
                        Err(close_err) => warn!(
                            buyer,
                            error = %e,
                            close_error = %close_err,
                            "buyer interrupted and transaction left open"
                        ),
                    },
                }
            });
        }
    });

    let leftover = finish_open_transaction(machine).context("closing leftover transaction")?;
    if !leftover.is_zero() {
        warn!(%leftover, "returned money left in the machine");
    }
    Ok(())
}

fn main() -> Result<()> {
    vendo_observability::init();

    let dump_journal = std::env::args().any(|a| a == "--journal");
    let machine = Arc::new(VendingMachine::new(
        MachineConfig::from_env(),
        Arc::new(InventoryLedger::new()),
    ));

    let catalog = [
        ("A1", "Cola", "3.50", 5),
        ("A2", "Chips", "5.00", 3),
        ("B1", "Water", "2.00", 10),
        ("B2", "Chocolate", "8.00", 2),
    ];
    for (code, name, price, stock) in catalog {
        let item = build_item(code, name, price).with_context(|| format!("building item {code}"))?;
        let id = item.item_id().clone();
        machine.register_item(item)?;
        machine.add_stock(&id, stock)?;
    }
    show_products(&machine)?;

    let cola = ItemId::new("A1")?;
    let chips = ItemId::new("A2")?;
    let water = ItemId::new("B1")?;
    let chocolate = ItemId::new("B2")?;

    buy_with_coins(&machine, &cola).context("coin purchase")?;
    buy_with_note(&machine, &chocolate).context("note purchase")?;
    underpay_and_cancel(&machine, &chips).context("cancelled purchase")?;
    sell_out(&machine, &chocolate).context("sell-out")?;
    show_products(&machine)?;

    let collected = machine.collect_revenue()?;
    info!(%collected, "revenue collected");

    concurrent_buyers(&machine, &water).context("concurrent purchases")?;
    show_products(&machine)?;
    let revenue = machine.collected_revenue()?;
    info!(%revenue, "demo finished");

    if dump_journal {
        let journal = machine.journal()?;
        println!("{}", serde_json::to_string_pretty(&journal)?);
    }

    Ok(())
}
