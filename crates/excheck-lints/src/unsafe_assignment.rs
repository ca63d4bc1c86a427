//! `unsafe_assignment`: a value flows into a location that accepts less.
//!
//! For every argument, assignment, and initializer, compare the source
//! expression's configuration with the target's at level 1: the source's
//! own evaluation throws are `uncaught_throw`'s business; only the
//! transferred value is checked here. Function literals are compared via
//! their body-inferred configuration (their expression configuration is
//! context-driven and would be trivially compatible).

use crate::context::LintContext;
use excheck_common::diagnostics::{lint_codes, lint_messages};
use excheck_common::Diagnostic;
use excheck_model::{ElementId, NodeData, NodeIndex, UnitId};
use excheck_resolver::Configuration;

pub fn unsafe_assignment(ctx: &LintContext<'_>, unit: UnitId) -> Vec<Diagnostic> {
    let program = ctx.program;
    let library = ctx.unit_library(unit);
    let mut diagnostics = Vec::new();

    let check = |source: NodeIndex, target: Option<Configuration>, out: &mut Vec<Diagnostic>| {
        let Some(target) = target else { return };
        let Some(source_configuration) = source_configuration(ctx, source) else {
            return;
        };
        if !source_configuration.is_compatible(&program.types, &target, 1) {
            out.push(ctx.diagnostic(
                ctx.node_span(source),
                library,
                lint_messages::UNSAFE_ASSIGNMENT.to_string(),
                lint_codes::UNSAFE_ASSIGNMENT,
            ));
        }
    };

    for index in program.arena.unit_nodes(unit) {
        let Some(node) = program.arena.get(index) else {
            continue;
        };
        match &node.data {
            NodeData::Invocation { callee, args } => {
                let Some(callee_element) = referenced_element(ctx, *callee) else {
                    continue;
                };
                for (parameter, argument) in pair_arguments(ctx, callee_element, args) {
                    let target = ctx.session.element_configuration(parameter);
                    check(argument, target, &mut diagnostics);
                }
            }
            NodeData::InstanceCreation { constructor, args } => {
                let Some(constructor) = constructor else { continue };
                for (parameter, argument) in pair_arguments(ctx, *constructor, args) {
                    let target = ctx.session.element_configuration(parameter);
                    check(argument, target, &mut diagnostics);
                }
            }
            NodeData::Assignment {
                target,
                value,
                setter,
            } => {
                let target_configuration = match setter {
                    Some(setter) => setter_value_target(ctx, *setter),
                    None => referenced_element(ctx, *target)
                        .and_then(|element| ctx.session.element_configuration(element)),
                };
                check(*value, target_configuration, &mut diagnostics);
            }
            NodeData::VariableDeclaration { element } => {
                let variable = program.elements.get(*element);
                if let Some(initializer) = variable.initializer {
                    let target = ctx.session.element_configuration(*element);
                    check(initializer, target, &mut diagnostics);
                }
            }
            _ => {}
        }
    }

    diagnostics
}

/// The configuration the assignment compares on the source side: the
/// body-inferred one for function literals, the expression configuration
/// otherwise.
fn source_configuration(ctx: &LintContext<'_>, node: NodeIndex) -> Option<Configuration> {
    let unwrapped = unwrap_argument(ctx, node);
    if let Some(inner) = ctx.program.arena.get(unwrapped) {
        if let NodeData::FunctionExpression { element, .. } = &inner.data {
            return ctx.session.element_configuration(*element);
        }
    }
    ctx.session.configuration(unwrapped)
}

/// Strip named-argument and parenthesized wrappers.
fn unwrap_argument(ctx: &LintContext<'_>, node: NodeIndex) -> NodeIndex {
    let mut current = node;
    while let Some(data) = ctx.program.arena.get(current).map(|n| &n.data) {
        match data {
            NodeData::NamedArgument { expr, .. } | NodeData::Parenthesized { expr } => {
                current = *expr;
            }
            _ => break,
        }
    }
    current
}

/// The element a callee expression resolves to.
fn referenced_element(ctx: &LintContext<'_>, node: NodeIndex) -> Option<ElementId> {
    match &ctx.program.arena.get(node)?.data {
        NodeData::Identifier { element }
        | NodeData::PropertyAccess { element, .. }
        | NodeData::ConstructorReference { element } => *element,
        _ => None,
    }
}

/// Pair call arguments with the callee's parameters: positionally, with
/// named arguments matched by name.
fn pair_arguments(
    ctx: &LintContext<'_>,
    callee: ElementId,
    args: &[NodeIndex],
) -> Vec<(ElementId, NodeIndex)> {
    let program = ctx.program;
    let parameters = program.elements.get(callee).parameters.clone();
    let mut pairs = Vec::new();
    let mut position = 0usize;

    for &argument in args {
        let named = match program.arena.get(argument).map(|n| &n.data) {
            Some(NodeData::NamedArgument { name, .. }) => Some(*name),
            _ => None,
        };
        match named {
            Some(name) => {
                if let Some(&parameter) = parameters
                    .iter()
                    .find(|&&parameter| program.elements.get(parameter).name == name)
                {
                    pairs.push((parameter, argument));
                }
            }
            None => {
                if let Some(&parameter) = parameters.get(position) {
                    pairs.push((parameter, argument));
                }
                position += 1;
            }
        }
    }
    pairs
}

/// The target configuration of a setter assignment: the setter's value
/// parameter when it has one, the setter itself otherwise.
fn setter_value_target(ctx: &LintContext<'_>, setter: ElementId) -> Option<Configuration> {
    let element = ctx.program.elements.get(setter);
    match element.parameters.first() {
        Some(&parameter) => ctx.session.element_configuration(parameter),
        None => ctx.session.element_configuration(setter),
    }
}
