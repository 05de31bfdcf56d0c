use chrono::{DateTime, Utc};

/// Something that happened to a machine: a stock change, a tender, a dispense.
///
/// Implementations are plain data. Once recorded in a journal they are never
/// mutated, and `event_type` stays stable across releases so journals written
/// by older builds remain readable.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. `"machine.transaction.settled"`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version. Bump when fields change meaning.
    fn version(&self) -> u32;

    fn occurred_at(&self) -> DateTime<Utc>;
}
