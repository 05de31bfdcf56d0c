//! Identity for domain objects that outlive their attribute values.

/// A domain object identified by key rather than by value.
///
/// A catalog item keeps its slot when its name or price is changed; equality
/// of two entities is decided by `id()` alone.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
