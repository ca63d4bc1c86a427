//! `uncaught_throw`: a thrown type is not permitted here.
//!
//! For every expression in the unit, compare its immediate throws with
//! what the enclosing function's configuration permits at body level
//! (invoke shell, plus await shell for async bodies), extended by the
//! catch clauses between the expression and the function. Functions whose
//! configuration was inferred from their own body permit everything they
//! throw, so only annotated (or override-pinned, or inherited) functions
//! report.

use crate::context::{CaughtType, LintContext};
use excheck_common::diagnostics::{format_message, lint_codes, lint_messages};
use excheck_common::Diagnostic;
use excheck_model::{TypeId, UnitId};
use excheck_resolver::equivalent_annotation_configuration;

pub fn uncaught_throw(ctx: &LintContext<'_>, unit: UnitId) -> Vec<Diagnostic> {
    let program = ctx.program;
    let types = &program.types;
    let library = ctx.unit_library(unit);
    let mut diagnostics = Vec::new();

    for index in program.arena.unit_nodes(unit) {
        let Some(node) = program.arena.get(index) else {
            continue;
        };
        if !node.data.is_expression() {
            continue;
        }
        let Some(configuration) = ctx.session.configuration(index) else {
            continue;
        };
        if configuration.throws.is_empty() {
            continue;
        }

        let Some((owner, caught)) = ctx.enclosing_function(index) else {
            continue;
        };
        let Some(owner_configuration) = ctx.session.element_configuration(owner) else {
            continue;
        };
        let owner_element = program.elements.get(owner);
        let Some(allowed) = equivalent_annotation_configuration(
            owner_element.kind.is_accessor(),
            owner_element.is_async(),
            &owner_configuration,
        ) else {
            continue;
        };

        for &thrown in configuration.throws.thrown_types() {
            let permitted = allowed.throws.covers(types, thrown)
                || caught_covers(ctx, &caught, thrown);
            if !permitted {
                diagnostics.push(ctx.diagnostic(
                    node.span,
                    library,
                    format_message(
                        lint_messages::UNCAUGHT_THROW,
                        &[&types.display(thrown)],
                    ),
                    lint_codes::UNCAUGHT_THROW,
                ));
            }
        }

        if configuration.throws.can_throw_undeclared
            && !allowed.throws.can_throw_undeclared
            && !catches_everything(ctx, &caught)
        {
            diagnostics.push(ctx.diagnostic(
                node.span,
                library,
                format_message(
                    lint_messages::UNCAUGHT_THROW,
                    &[&types.display(TypeId::OBJECT)],
                ),
                lint_codes::UNCAUGHT_THROW,
            ));
        }
    }

    diagnostics
}

fn caught_covers(ctx: &LintContext<'_>, caught: &[CaughtType], thrown: TypeId) -> bool {
    caught.iter().any(|clause| match clause {
        None => true,
        Some(caught_type) => ctx
            .program
            .types
            .is_assignable_to(thrown, *caught_type),
    })
}

fn catches_everything(ctx: &LintContext<'_>, caught: &[CaughtType]) -> bool {
    caught.iter().any(|clause| match clause {
        None => true,
        Some(caught_type) => ctx
            .program
            .types
            .is_assignable_to(TypeId::OBJECT, *caught_type),
    })
}
