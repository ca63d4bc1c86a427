//! `unsafe_override`: an override widens what its supertypes declared.
//!
//! For every non-static instance member of a class or mixin, intersect
//! the configurations of everything it overrides and require the member's
//! own configuration to be compatible with that intersection at level 0.

use crate::context::LintContext;
use excheck_common::diagnostics::{lint_codes, lint_messages};
use excheck_common::Diagnostic;
use excheck_model::{ElementFlags, ElementKind, UnitId};

pub fn unsafe_override(ctx: &LintContext<'_>, unit: UnitId) -> Vec<Diagnostic> {
    let program = ctx.program;
    let library = ctx.unit_library(unit);
    let mut diagnostics = Vec::new();

    for (id, element) in program.elements.iter() {
        if element.location.library != library {
            continue;
        }
        if element.is_static()
            || element.flags.contains(ElementFlags::SYNTHETIC)
            || !matches!(
                element.kind,
                ElementKind::Method
                    | ElementKind::Getter
                    | ElementKind::Setter
                    | ElementKind::Field
            )
        {
            continue;
        }
        let Some(enclosing) = element.enclosing else {
            continue;
        };
        if !matches!(
            program.elements.get(enclosing).kind,
            ElementKind::Class | ElementKind::Mixin
        ) {
            continue;
        }

        let Some(inherited) = ctx.session.inherited_configuration(id) else {
            continue;
        };
        let Some(member) = ctx.session.element_configuration(id) else {
            continue;
        };
        if !member.is_compatible(&program.types, &inherited, 0) {
            diagnostics.push(ctx.diagnostic(
                element.span,
                library,
                lint_messages::UNSAFE_OVERRIDE.to_string(),
                lint_codes::UNSAFE_OVERRIDE,
            ));
        }
    }

    diagnostics
}
