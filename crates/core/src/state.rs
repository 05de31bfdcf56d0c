//! Machine state and operation vocabulary.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a vending machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    /// No transaction in flight.
    Idle,
    /// An item is selected; payment is being collected.
    AwaitingPayment,
    /// Payment covers the price; the item can be dispensed and the purchase settled.
    Dispensing,
}

impl core::fmt::Display for MachineState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            MachineState::Idle => "idle",
            MachineState::AwaitingPayment => "awaiting payment",
            MachineState::Dispensing => "dispensing",
        };
        f.write_str(s)
    }
}

/// Caller-facing transaction operations (used in state errors and logs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Select,
    Tender,
    Dispense,
    Settle,
    Cancel,
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Operation::Select => "select",
            Operation::Tender => "tender",
            Operation::Dispense => "dispense",
            Operation::Settle => "settle",
            Operation::Cancel => "cancel",
        };
        f.write_str(s)
    }
}
