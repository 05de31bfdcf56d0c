//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. `Money` is the
/// canonical example in this workspace: `Money::from_minor(350)` equals any
/// other `Money::from_minor(350)`, and "changing" an amount means producing a
/// new value through checked arithmetic.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (two value objects with same values are equal)
/// - **Entity**: Has identity (two items with the same `ItemId` are the same item)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
