//! Lint drivers.
//!
//! Three read-only rules over the resolver:
//!
//! - `uncaught_throw` - a throw site whose thrown type is not permitted by
//!   the enclosing function's configuration plus the enclosing catch
//!   clauses;
//! - `unsafe_assignment` - an argument, assignment, or initializer whose
//!   source configuration is not a subtype of the target's;
//! - `unsafe_override` - an instance member whose configuration is not
//!   compatible with the intersection of the members it overrides.

pub mod context;
pub use context::LintContext;

pub mod uncaught_throw;
pub use uncaught_throw::uncaught_throw;

pub mod unsafe_assignment;
pub use unsafe_assignment::unsafe_assignment;

pub mod unsafe_override;
pub use unsafe_override::unsafe_override;

use excheck_common::Diagnostic;
use excheck_model::UnitId;

/// Run all three rules over one compilation unit.
pub fn check_unit(ctx: &LintContext<'_>, unit: UnitId) -> Vec<Diagnostic> {
    let mut diagnostics = uncaught_throw(ctx, unit);
    diagnostics.extend(unsafe_assignment(ctx, unit));
    diagnostics.extend(unsafe_override(ctx, unit));
    diagnostics.sort_by_key(|diagnostic| (diagnostic.span, diagnostic.code));
    tracing::debug!(unit = unit.0, count = diagnostics.len(), "lint pass complete");
    diagnostics
}
