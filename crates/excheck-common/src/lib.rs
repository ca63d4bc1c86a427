//! Common types and utilities for the excheck checked-exceptions analyzer.
//!
//! This crate provides foundational types used across all excheck crates:
//! - String interning (`Atom`, `Interner`)
//! - Source spans (`Span`, `Spanned`)
//! - Diagnostics (`Diagnostic`, `DiagnosticCategory`, lint codes/messages)
//! - Centralized limits and thresholds

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner};

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Span, Spanned};

// Diagnostics emitted by the lint drivers
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory};

// Centralized limits and thresholds
pub mod limits;
