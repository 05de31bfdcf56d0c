//! Machine events and their in-process distribution.
//!
//! Events are facts about accepted machine operations. The machine wraps each
//! one in an [`EventEnvelope`] and fans it out over an [`EventBus`].

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
