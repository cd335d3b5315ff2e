//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values.
/// `MonetaryAmount` and `InvoiceLineItem` are value objects; an `Invoice` or a
/// `Check` is not, because two of them with identical fields are still two
/// different records.
///
/// To "modify" a value object, build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
