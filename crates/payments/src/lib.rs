//! Payment collection for a single in-flight transaction.

pub mod accumulator;
pub mod denomination;

pub use accumulator::PaymentAccumulator;
pub use denomination::{Coin, Note};
