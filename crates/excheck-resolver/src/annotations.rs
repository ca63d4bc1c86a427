//! Annotation reader.
//!
//! Extracts a [`Throws`] summary from an element's metadata list. Rules,
//! applied in declaration order and combined over all annotations:
//!
//! - `neverThrows` wins immediately: nothing may be thrown at all.
//! - `safe` alone: nothing declared, undeclared Errors stay allowed.
//! - `ThrowsError<E>` adds `E` and keeps undeclared Errors allowed.
//! - `Throws<E>` adds `E` and forbids undeclared Errors.
//! - No recognized annotation: no summary (the caller falls back to
//!   inference).
//!
//! Mixing marker families on one element is surfaced through
//! `has_conflict` for a host lint, but does not change the semantics: the
//! reader accumulates whatever is present.

use crate::throws::Throws;
use excheck_model::{Annotation, Element, TypeStore};

/// What the reader extracted from an element's metadata.
#[derive(Clone, Debug)]
pub struct AnnotationSummary {
    /// `None` when no recognized annotation is present.
    pub throws: Option<Throws>,
    /// The element mixes `safe`/`neverThrows` with `Throws`/`ThrowsError`.
    pub has_conflict: bool,
}

/// Read an element's metadata into a summary.
pub fn read_annotations(types: &TypeStore, element: &Element) -> AnnotationSummary {
    let mut saw_safe = false;
    let mut saw_never_throws = false;
    let mut saw_throws = false;
    let mut saw_throws_error = false;
    let mut thrown = Vec::new();

    for annotation in &element.metadata {
        match annotation {
            Annotation::Safe => saw_safe = true,
            Annotation::NeverThrows => saw_never_throws = true,
            Annotation::Throws(ty) => {
                saw_throws = true;
                thrown.push(*ty);
            }
            Annotation::ThrowsError(ty) => {
                saw_throws_error = true;
                thrown.push(*ty);
            }
            Annotation::Other(_) => {}
        }
    }

    let has_conflict =
        (saw_never_throws || saw_safe) && (saw_throws || saw_throws_error);

    let throws = if saw_never_throws {
        Some(Throws::explicit(types, [], false))
    } else if saw_throws || saw_throws_error {
        // Any Throws<> forbids undeclared Errors; ThrowsError<> alone
        // keeps them allowed.
        Some(Throws::explicit(types, thrown, !saw_throws))
    } else if saw_safe {
        Some(Throws::explicit(types, [], true))
    } else {
        None
    };

    AnnotationSummary {
        throws,
        has_conflict,
    }
}

/// The declared throws of an element, if it carries any recognized
/// annotation.
pub fn declared_throws(types: &TypeStore, element: &Element) -> Option<Throws> {
    read_annotations(types, element).throws
}
