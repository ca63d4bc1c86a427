//! Resolved annotation metadata.
//!
//! The host front end resolves annotation constants before hand-off; the
//! core only sees which of the four markers an element carries. Anything
//! else in an element's metadata list arrives as `Other` and is ignored by
//! the annotation reader.

use crate::types::TypeId;
use excheck_common::Atom;

/// One entry of an element's metadata list, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Annotation {
    /// `@safe` - throws no Exceptions; Errors remain allowed.
    Safe,
    /// `@neverThrows` - throws nothing at all.
    NeverThrows,
    /// `@Throws<E>` - throws `E`; undeclared Errors are not allowed.
    Throws(TypeId),
    /// `@ThrowsError<E>` - throws `E`; undeclared Errors stay allowed.
    ThrowsError(TypeId),
    /// Unrecognized metadata, kept for completeness.
    Other(Atom),
}
