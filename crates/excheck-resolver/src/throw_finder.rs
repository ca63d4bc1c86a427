//! Throw finder.
//!
//! Walks a function body or variable initializer and collects, per AST
//! node, the *immediate* throws that node contributes (not
//! subtree-cumulative: every expression node reports only its own
//! configuration's top-level throws). The walk:
//!
//! - does not descend into nested function expressions (they carry their
//!   own configurations; their uses contribute through the expression
//!   visitor),
//! - skips initializers of `late` variables (evaluation is deferred to
//!   first access and surfaces through the variable's configuration),
//! - subtracts caught types at try/catch boundaries: a typed clause
//!   removes the caught subtypes from the protected body's entries, an
//!   untyped clause clears them entirely. Catch bodies and finally blocks
//!   are visited normally.

use crate::session::ResolverSession;
use crate::throws::Throws;
use excheck_model::{NodeData, NodeIndex, TypeStore};
use rustc_hash::FxHashMap;

/// Per-node immediate throws of a body or initializer.
pub fn body_throws(
    session: &ResolverSession<'_>,
    body: NodeIndex,
) -> FxHashMap<NodeIndex, Throws> {
    let mut out = FxHashMap::default();
    visit(session, body, &mut out);
    out
}

/// Antichain union of everything a body contributes, as inferred throws.
///
/// The result is always flagged inferred even when individual entries
/// were anchored by callee annotations: inference never outranks an
/// explicit summary in later merges.
pub fn inferred_throws(types: &TypeStore, map: &FxHashMap<NodeIndex, Throws>) -> Throws {
    let mut keys: Vec<NodeIndex> = map.keys().copied().collect();
    keys.sort();
    let mut result = Throws::empty();
    for key in keys {
        result.union_with(types, &map[&key]);
    }
    result.inferred = true;
    result
}

fn visit(
    session: &ResolverSession<'_>,
    index: NodeIndex,
    out: &mut FxHashMap<NodeIndex, Throws>,
) {
    let program = session.program();
    let Some(node) = program.arena.get(index) else {
        return;
    };
    match &node.data {
        // Nested function expressions have their own configurations.
        NodeData::FunctionExpression { .. } => {}

        NodeData::VariableDeclaration { element } => {
            let variable = program.elements.get(*element);
            if variable.is_late() {
                // Deferred to first access; handled by the variable's
                // configuration.
                return;
            }
            if let Some(initializer) = variable.initializer {
                visit(session, initializer, out);
            }
        }

        NodeData::Try {
            body,
            catches,
            finally,
        } => {
            let mut protected = FxHashMap::default();
            visit(session, *body, &mut protected);
            for &catch_index in catches.iter() {
                let Some(catch_node) = program.arena.get(catch_index) else {
                    continue;
                };
                if let NodeData::CatchClause { exception_type, .. } = &catch_node.data {
                    for throws in protected.values_mut() {
                        throws.subtract_caught(&program.types, *exception_type);
                    }
                }
            }
            protected.retain(|_, throws| !throws.is_vacuous());
            out.extend(protected);

            for &catch_index in catches.iter() {
                let Some(catch_node) = program.arena.get(catch_index) else {
                    continue;
                };
                if let NodeData::CatchClause { body, .. } = &catch_node.data {
                    visit(session, *body, out);
                }
            }
            if let Some(finally) = finally {
                visit(session, *finally, out);
            }
        }

        data => {
            if data.is_expression() {
                if let Some(configuration) = session.demand_node(index) {
                    if !configuration.throws.is_vacuous() {
                        out.insert(index, configuration.throws);
                    }
                }
            }
            for child in data.children() {
                visit(session, child, out);
            }
        }
    }
}
