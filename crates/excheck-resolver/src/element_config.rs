//! Element configuration computer.
//!
//! For an element, the returned configuration combines (in fixed
//! precedence) the override table, explicit annotations, inference over
//! the body or initializer, type-derived slots, and the intersected
//! configuration inherited from overridden members:
//!
//! - the override table wins over everything, including explicit
//!   annotations;
//! - for executables: declared annotation, else inference when a body
//!   exists, else the inherited intersection;
//! - for variables: a priority merge of initializer, declared type,
//!   slot-placed annotations, and (for fields) the inherited
//!   configuration, where an explicit summary always beats an inferred
//!   one at the same slot.
//!
//! `adapt` wraps the raw body throws into the right access level: async
//! bodies go under `await`, non-accessors under `invoke`.
//! `equivalent_annotation_configuration` is its inverse and recovers the
//! summary that would have to be annotated on the body.

use crate::annotations::declared_throws;
use crate::configuration::{Configuration, PromotionKind, PromotionMap};
use crate::inheritance;
use crate::session::ResolverSession;
use crate::throw_finder;
use crate::throws::Throws;
use crate::type_config::type_configuration;
use excheck_model::{Element, ElementFlags, ElementId, ElementKind, TypeId};
use tracing::trace;

/// Wrap body-level throws into the element's access shape.
pub fn adapt(
    is_accessor: bool,
    is_async: bool,
    throws: Throws,
    return_configuration: PromotionMap,
) -> Configuration {
    let mut current = Configuration::new(throws, return_configuration);
    if is_async {
        current = Configuration::for_value(
            [(PromotionKind::Await, current)].into_iter().collect(),
        );
    }
    if !is_accessor {
        current = Configuration::for_value(
            [(PromotionKind::Invoke, current)].into_iter().collect(),
        );
    }
    current
}

/// Inverse of [`adapt`]: unwrap the access shells to recover the
/// body-level configuration. `None` when the expected shells are missing.
pub fn equivalent_annotation_configuration(
    is_accessor: bool,
    is_async: bool,
    configuration: &Configuration,
) -> Option<Configuration> {
    let mut current = configuration;
    if !is_accessor {
        current = current.invoke()?;
    }
    if is_async {
        current = current.awaited()?;
    }
    Some(current.clone())
}

pub(crate) fn compute(
    session: &ResolverSession<'_>,
    element_id: ElementId,
) -> Option<Configuration> {
    let program = session.program();
    let element = program.elements.get(element_id);

    // 1. Override table entries are returned verbatim.
    if let Some(entry) = session.overrides().get(&element.location) {
        trace!(element = element_id.0, "override table hit");
        return Some(entry.clone());
    }

    if element.kind.is_executable() {
        // Synthetic property accessors forward to their field.
        if element.kind.is_accessor() && element.flags.contains(ElementFlags::SYNTHETIC) {
            if let Some(field) = element.field {
                return session.demand_element(field);
            }
        }
        // Synthetic default constructors invoke to nothing.
        if element.kind == ElementKind::Constructor
            && element.flags.contains(ElementFlags::SYNTHETIC)
            && element.body.is_none()
        {
            return Some(Configuration::for_value(
                [(PromotionKind::Invoke, Configuration::empty())]
                    .into_iter()
                    .collect(),
            ));
        }
        return compute_executable(session, element_id, element);
    }

    if element.kind.is_variable() {
        return compute_variable(session, element_id, element);
    }

    // Classes, mixins, and typedefs are not values.
    None
}

fn compute_executable(
    session: &ResolverSession<'_>,
    element_id: ElementId,
    element: &Element,
) -> Option<Configuration> {
    let program = session.program();
    let types = &program.types;
    let is_accessor = element.kind.is_accessor();
    let is_async = element.is_async();

    // An async body produces the future's value; the await shell is added
    // by adapt, so derive the result slots from the unwrapped type.
    let return_type = element.ty.map(|ret| {
        if is_async {
            types.future_value(ret).unwrap_or(ret)
        } else {
            ret
        }
    });
    let return_configuration = return_type
        .map(|ret| type_configuration(program, ret))
        .unwrap_or_default();

    let declared = declared_throws(types, element);
    let chosen = if let Some(declared) = declared {
        declared
    } else if let Some(body) = element.body {
        let per_node = throw_finder::body_throws(session, body);
        throw_finder::inferred_throws(types, &per_node)
    } else if let Some(inherited) = inheritance::inherited_configuration(session, element_id) {
        // Abstract members adopt the intersection of what they override.
        equivalent_annotation_configuration(is_accessor, is_async, &inherited)
            .map(|inner| inner.throws)
            .unwrap_or_else(Throws::empty)
    } else {
        Throws::empty()
    };

    Some(adapt(is_accessor, is_async, chosen, return_configuration))
}

fn compute_variable(
    session: &ResolverSession<'_>,
    element_id: ElementId,
    element: &Element,
) -> Option<Configuration> {
    let program = session.program();
    let types = &program.types;
    let mut parts: Vec<Configuration> = Vec::new();

    if let Some(initializer) = element.initializer {
        let value = session
            .demand_node(initializer)
            .map(|configuration| configuration.value)
            .unwrap_or_default();
        let throws = if element.is_late() {
            // Late initializers run on first read; their throws surface
            // as the variable's access throws.
            let per_node = throw_finder::body_throws(session, initializer);
            throw_finder::inferred_throws(types, &per_node)
        } else {
            Throws::empty()
        };
        parts.push(Configuration::new(throws, value));
    }

    if !element.flags.contains(ElementFlags::IMPLICIT_TYPE) {
        if let Some(ty) = element.ty {
            let slots = type_configuration(program, ty);
            if !slots.is_empty() {
                parts.push(Configuration::for_value(slots));
            }
        }
    }

    if let Some(declared) = declared_throws(types, element) {
        match annotation_slot(session, element.ty) {
            Some(kind) => parts.push(Configuration::for_value(
                [(kind, Configuration::from_throws(declared))]
                    .into_iter()
                    .collect(),
            )),
            None => {
                trace!(
                    element = element_id.0,
                    "annotation ignored: neither callable nor future shaped"
                );
            }
        }
    }

    if element.kind == ElementKind::Field && !element.is_static() {
        if let Some(inherited) = inheritance::inherited_configuration(session, element_id) {
            parts.push(inherited);
        }
    }

    if parts.is_empty() {
        return Some(Configuration::empty());
    }
    Some(resolve_merge(parts))
}

/// Which slot a variable annotation applies to: `invoke` for callable
/// types, `await` for future types, nothing when the shape is ambiguous
/// or neither.
fn annotation_slot(
    session: &ResolverSession<'_>,
    ty: Option<TypeId>,
) -> Option<PromotionKind> {
    let ty = ty?;
    let types = &session.program().types;
    let callable = types.as_function(ty).is_some() || types.call_method(ty).is_some();
    let future = types.future_value(ty).is_some();
    match (callable, future) {
        (true, false) => Some(PromotionKind::Invoke),
        (false, true) => Some(PromotionKind::Await),
        _ => None,
    }
}

/// Priority merge: earlier parts win, except that an explicit summary
/// beats an inferred one at the same level, and anything beats a vacuous
/// summary. Value slots merge pointwise, recursively.
fn resolve_merge(parts: Vec<Configuration>) -> Configuration {
    let mut iter = parts.into_iter();
    let Some(mut result) = iter.next() else {
        return Configuration::empty();
    };
    for next in iter {
        result = merge_prefer(result, next);
    }
    result
}

fn merge_prefer(a: Configuration, b: Configuration) -> Configuration {
    let throws = if (a.throws.inferred && !b.throws.inferred)
        || (a.throws.is_vacuous() && !b.throws.is_vacuous())
    {
        b.throws
    } else {
        a.throws
    };

    let mut value = PromotionMap::new();
    for kind in PromotionKind::ALL {
        match (a.value.get(kind), b.value.get(kind)) {
            (Some(x), Some(y)) => value.insert(kind, merge_prefer(x.clone(), y.clone())),
            (Some(x), None) => value.insert(kind, x.clone()),
            (None, Some(y)) => value.insert(kind, y.clone()),
            (None, None) => {}
        }
    }
    Configuration::new(throws, value)
}
