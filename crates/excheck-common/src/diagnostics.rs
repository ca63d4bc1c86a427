//! Diagnostic types and message lookup for the lint drivers.
//!
//! The analyzer surfaces exactly three user-visible diagnostics
//! (`uncaught_throw`, `unsafe_assignment`, `unsafe_override`); everything
//! else is an internal "no information" outcome that produces no output.

use crate::span::Span;
use serde::Serialize;

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
}

/// A lint diagnostic at a concrete source location.
#[derive(Clone, Debug, Serialize)]
pub struct Diagnostic {
    /// Library URI of the compilation unit the span belongs to.
    pub library: String,
    pub span: Span,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(library: String, span: Span, message: String, code: u32) -> Self {
        Self {
            library,
            span,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
        }
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Stable codes for the three lint rules.
pub mod lint_codes {
    pub const UNCAUGHT_THROW: u32 = 6001;
    pub const UNSAFE_ASSIGNMENT: u32 = 6002;
    pub const UNSAFE_OVERRIDE: u32 = 6003;
}

/// Message templates for the three lint rules.
///
/// Templates use `{0}`, `{1}`, ... placeholders; fill them with
/// [`format_message`].
pub mod lint_messages {
    pub const UNCAUGHT_THROW: &str = "{0} can't be thrown here";
    pub const UNSAFE_ASSIGNMENT: &str = "This assignment is potentially unsafe";
    pub const UNSAFE_OVERRIDE: &str =
        "This override's configuration isn't compatible with the overridden configuration";
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// All lint diagnostics this analyzer can emit.
pub const DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: lint_codes::UNCAUGHT_THROW,
        category: DiagnosticCategory::Error,
        message: lint_messages::UNCAUGHT_THROW,
    },
    DiagnosticMessage {
        code: lint_codes::UNSAFE_ASSIGNMENT,
        category: DiagnosticCategory::Error,
        message: lint_messages::UNSAFE_ASSIGNMENT,
    },
    DiagnosticMessage {
        code: lint_codes::UNSAFE_OVERRIDE,
        category: DiagnosticCategory::Error,
        message: lint_messages::UNSAFE_OVERRIDE,
    },
];

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}
