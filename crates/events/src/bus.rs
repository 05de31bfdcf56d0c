//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes machine events to any number of observers (audit
//! logs, dashboards, tests). It makes minimal assumptions:
//!
//! - **Transport-agnostic**: the in-memory channel bus is the only implementation today
//! - **Broadcast semantics**: each subscriber gets a copy of every published message
//! - **No persistence**: the machine journal is the record; the bus only distributes

use std::sync::Arc;
use std::sync::mpsc::Receiver;

/// A subscription to an event stream.
///
/// ```ignore
/// let subscription = machine.subscribe();
/// machine.select(&cola)?;
///
/// for envelope in subscription.drain() {
///     audit(envelope);
/// }
/// ```
///
/// Subscriptions are meant for a single consuming thread. Messages from one
/// publisher arrive in publication order.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain every message currently queued without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// `publish()` can fail; callers decide whether that matters. The vending
/// machine logs and ignores publication failures because its journal already
/// holds the event.
///
/// Implementations must be `Send + Sync`: several threads may publish at once.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
