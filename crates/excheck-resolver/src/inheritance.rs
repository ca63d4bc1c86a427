//! Inherited configurations.
//!
//! For an instance member, walk the declaring interface's direct
//! supertypes (superclass, implemented interfaces, mixins, and mixin
//! superclass constraints) breadth-first. In each visited supertype, look
//! for a non-static, non-constructor member with the same name - for
//! private members only within the member's own library. When one is
//! found its configuration is collected and that branch is not descended
//! further; otherwise the walk continues into that supertype's supers.
//! The result is the intersection of everything collected: an override
//! must satisfy all of its overridden members at once.
//!
//! Enqueue order does not matter: intersection is commutative and
//! associative.

use crate::configuration::Configuration;
use crate::lattice::intersect;
use crate::session::ResolverSession;
use excheck_model::{ElementId, ElementKind, TypeId};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::warn;

pub(crate) fn inherited_configuration(
    session: &ResolverSession<'_>,
    member_id: ElementId,
) -> Option<Configuration> {
    let program = session.program();
    let member = program.elements.get(member_id);
    if member.is_static() || member.kind == ElementKind::Constructor {
        return None;
    }
    let class_id = member.enclosing?;
    let class = program.elements.get(class_id);
    if !matches!(class.kind, ElementKind::Class | ElementKind::Mixin) {
        return None;
    }

    let member_name = member.name;
    let is_private = program
        .interner
        .resolve(member_name)
        .starts_with('_');
    let member_library = member.library();

    let mut queue: VecDeque<TypeId> = VecDeque::new();
    let class_interface = program.types.as_interface(class.ty?)?;
    enqueue_supers(&mut queue, class_interface);

    let mut visited: FxHashSet<TypeId> = FxHashSet::default();
    let mut collected: Vec<Configuration> = Vec::new();

    while let Some(super_ty) = queue.pop_front() {
        if queue.len() > excheck_common::limits::MAX_SUPERTYPE_QUEUE {
            warn!(member = member_id.0, "supertype walk exceeded queue limit");
            break;
        }
        if !visited.insert(super_ty) {
            continue;
        }
        let Some(interface) = program.types.as_interface(super_ty) else {
            continue;
        };
        let candidate = interface.declaration.and_then(|declaration| {
            program
                .elements
                .get(declaration)
                .members
                .iter()
                .copied()
                .find(|&candidate_id| {
                    let candidate = program.elements.get(candidate_id);
                    candidate.name == member_name
                        && !candidate.is_static()
                        && candidate.kind != ElementKind::Constructor
                        && (!is_private || candidate.library() == member_library)
                })
        });
        match candidate {
            Some(candidate_id) => {
                // Found: collect and stop descending through this super.
                if let Some(configuration) = session.demand_element(candidate_id) {
                    collected.push(configuration);
                }
            }
            None => enqueue_supers(&mut queue, interface),
        }
    }

    if collected.is_empty() {
        None
    } else {
        Some(intersect(&program.types, &collected))
    }
}

fn enqueue_supers(queue: &mut VecDeque<TypeId>, interface: &excheck_model::InterfaceData) {
    queue.extend(interface.supertype);
    queue.extend(interface.interfaces.iter().copied());
    queue.extend(interface.mixins.iter().copied());
    queue.extend(interface.on_types.iter().copied());
}
