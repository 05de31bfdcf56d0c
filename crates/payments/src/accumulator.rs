use tracing::debug;

use vendo_core::{Money, VendingError, VendingResult};

/// Running total of value tendered toward the current transaction.
///
/// Not synchronized on its own; the machine owns one behind its lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentAccumulator {
    total: Money,
}

impl PaymentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a positive amount. Zero and overflow are rejected and leave the
    /// total unchanged.
    pub fn tender(&mut self, amount: Money) -> VendingResult<Money> {
        if amount.is_zero() {
            return Err(VendingError::invalid_amount("amount must be positive"));
        }
        let total = self
            .total
            .checked_add(amount)
            .ok_or_else(|| VendingError::invalid_amount("tendered total would overflow"))?;

        self.total = total;
        debug!(%amount, %total, "payment tendered");
        Ok(total)
    }

    pub fn total(&self) -> Money {
        self.total
    }

    /// Zero the accumulator, returning what it held.
    pub fn reset(&mut self) -> Money {
        std::mem::take(&mut self.total)
    }
}
