//! Expression configuration visitor.
//!
//! Computes the configuration of a single expression node, delegating to
//! element lookups, to nested expressions, or to literal rules. A `None`
//! result means "no information": the declaration behind the expression
//! could not be located, and downstream treats the expression as
//! permitting anything rather than reporting on it.
//!
//! Dispatch is a single match over the node kind; the interesting rows:
//!
//! | expression | throws | value |
//! |---|---|---|
//! | literal, `this`, `super`, `is`, type literal | - | - |
//! | parenthesized, named argument | - | inner value |
//! | identifier, property access, constructor ref | element's | element's |
//! | call, index, instance creation, binary | - | callee's `invoke` slot |
//! | `await e` | - | `e`'s `await` slot (or `e`'s value) |
//! | `a = b` | setter's | `b`'s value |
//! | `?:`, switch expression | union of branches | union |
//! | `e as T`, `e!` | `TypeError` | inner value |
//! | `throw e` | static type of `e` | `e`'s value |
//! | `rethrow` | enclosing catch's type, else `Object` | - |

use crate::configuration::Configuration;
use crate::lattice::union;
use crate::session::ResolverSession;
use crate::throws::Throws;
use excheck_model::{ElementId, ElementKind, NodeData, NodeIndex, TypeData, TypeId};
use tracing::trace;

pub(crate) fn compute(
    session: &ResolverSession<'_>,
    index: NodeIndex,
) -> Option<Configuration> {
    let program = session.program();
    let node = program.arena.get(index)?;

    match &node.data {
        NodeData::NullLiteral
        | NodeData::BoolLiteral(_)
        | NodeData::IntLiteral(_)
        | NodeData::StringLiteral(_)
        | NodeData::This
        | NodeData::Super
        | NodeData::IsTest { .. }
        | NodeData::TypeLiteral(_) => Some(Configuration::empty()),

        NodeData::Parenthesized { expr } | NodeData::NamedArgument { expr, .. } => {
            let inner = session.demand_node(*expr)?;
            Some(Configuration::for_value(inner.value))
        }

        NodeData::Identifier { element }
        | NodeData::PropertyAccess { element, .. }
        | NodeData::ConstructorReference { element } => match element {
            Some(element) => {
                // A setter reference only occurs as an assignment target;
                // its throws belong to the assignment node.
                if program.elements.get(*element).kind == ElementKind::Setter {
                    return Some(Configuration::empty());
                }
                session.demand_element(*element)
            }
            None => {
                trace!(node = index.0, "unresolved reference");
                None
            }
        },

        NodeData::Invocation { callee, .. } => {
            let callee_configuration = session.demand_node(*callee)?;
            Some(promote_invoke(&callee_configuration))
        }

        NodeData::Index { element, .. } => Some(invoke_member(session, *element)),

        NodeData::InstanceCreation { constructor, .. } => {
            Some(invoke_member(session, *constructor))
        }

        NodeData::Binary { operator, .. } => Some(invoke_member(session, *operator)),

        NodeData::Await { expr } => {
            let inner = session.demand_node(*expr)?;
            match inner.awaited() {
                Some(awaited) => Some(awaited.clone()),
                // Awaiting a non-future yields the value itself.
                None => Some(Configuration::for_value(inner.value)),
            }
        }

        NodeData::Assignment { value, setter, .. } => {
            let throws = match setter {
                Some(setter) => session
                    .demand_element(*setter)
                    .map(|configuration| configuration.throws)
                    .unwrap_or_else(Throws::empty),
                None => Throws::empty(),
            };
            let value_slots = session
                .demand_node(*value)
                .map(|configuration| configuration.value)
                .unwrap_or_default();
            Some(Configuration::new(throws, value_slots))
        }

        NodeData::Conditional {
            then_branch,
            else_branch,
            ..
        } => Some(union_of_nodes(session, [*then_branch, *else_branch])),

        NodeData::SwitchExpression { arms, .. } => {
            Some(union_of_nodes(session, arms.iter().copied()))
        }

        NodeData::IfNull { left, right } => {
            let merged = union_of_nodes(session, [*left, *right]);
            Some(Configuration::for_value(merged.value))
        }

        NodeData::FunctionExpression { element, parameter } => {
            // Context first: a literal flowing into a parameter adopts the
            // parameter's configuration, throwing only what the receiver
            // accepts.
            if let Some(parameter) = parameter {
                if let Some(configuration) = session.demand_element(*parameter) {
                    return Some(configuration);
                }
            }
            session.demand_element(*element)
        }

        NodeData::Cast { expr, ty } => {
            let inner = session
                .demand_node(*expr)
                .map(|configuration| configuration.value)
                .unwrap_or_default();
            let throws = if cast_never_fails(session, *ty) {
                Throws::empty()
            } else {
                Throws::of_type(TypeId::TYPE_ERROR)
            };
            Some(Configuration::new(throws, inner))
        }

        NodeData::NonNullAssert { expr } => {
            let inner = session
                .demand_node(*expr)
                .map(|configuration| configuration.value)
                .unwrap_or_default();
            Some(Configuration::new(Throws::of_type(TypeId::TYPE_ERROR), inner))
        }

        NodeData::Throw { expr } => {
            let thrown = program
                .arena
                .get(*expr)
                .and_then(|operand| operand.static_type)
                .unwrap_or(TypeId::OBJECT);
            let value = session
                .demand_node(*expr)
                .map(|configuration| configuration.value)
                .unwrap_or_default();
            Some(Configuration::new(Throws::of_type(thrown), value))
        }

        NodeData::Rethrow => {
            let caught = enclosing_catch_type(session, index).unwrap_or(TypeId::OBJECT);
            Some(Configuration::throws_exactly(caught))
        }

        NodeData::PatternAssignment { value } => {
            // Refutable patterns surface as StateError; precise pattern
            // analysis is out of scope.
            let slots = session
                .demand_node(*value)
                .map(|configuration| configuration.value)
                .unwrap_or_default();
            Some(Configuration::new(
                Throws::of_type(TypeId::STATE_ERROR),
                slots,
            ))
        }

        data => {
            trace!(node = index.0, kind = ?data.kind(), "not an expression");
            None
        }
    }
}

/// The configuration obtained by invoking a value with `configuration`.
///
/// A callee without an `invoke` slot is a dynamic call and may fail with
/// `NoSuchMethodError`.
fn promote_invoke(configuration: &Configuration) -> Configuration {
    match configuration.invoke() {
        Some(invoked) => invoked.clone(),
        None => Configuration::throws_exactly(TypeId::NO_SUCH_METHOD_ERROR),
    }
}

/// Invoke through a resolved member (operator, index operator,
/// constructor). An unresolved member contributes nothing: primitive
/// operators do not throw.
fn invoke_member(session: &ResolverSession<'_>, member: Option<ElementId>) -> Configuration {
    match member {
        Some(member) => match session.demand_element(member) {
            Some(configuration) => promote_invoke(&configuration),
            None => Configuration::empty(),
        },
        None => Configuration::empty(),
    }
}

fn union_of_nodes(
    session: &ResolverSession<'_>,
    nodes: impl IntoIterator<Item = NodeIndex>,
) -> Configuration {
    let configurations: Vec<Configuration> = nodes
        .into_iter()
        .filter_map(|node| session.demand_node(node))
        .collect();
    union(&session.program().types, &configurations)
}

/// `e as T` cannot fail when `T` is `dynamic`, `void`, or nullable
/// `Object` (the top types).
fn cast_never_fails(session: &ResolverSession<'_>, ty: TypeId) -> bool {
    if ty == TypeId::DYNAMIC || ty == TypeId::VOID {
        return true;
    }
    matches!(
        session.program().types.get(ty),
        TypeData::Nullable { inner } if *inner == TypeId::OBJECT
    )
}

/// The declared exception type of the catch clause enclosing a `rethrow`.
fn enclosing_catch_type(session: &ResolverSession<'_>, index: NodeIndex) -> Option<TypeId> {
    let arena = &session.program().arena;
    let mut current = arena.parent(index);
    while let Some(parent) = current {
        if let Some(node) = arena.get(parent) {
            if let NodeData::CatchClause { exception_type, .. } = &node.data {
                return *exception_type;
            }
        }
        current = arena.parent(parent);
    }
    None
}
