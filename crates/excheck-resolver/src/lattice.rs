//! Lattice operations over configurations.
//!
//! Three operations drive every comparison in the analyzer:
//!
//! - [`union`] merges alternative paths (branches of a conditional,
//!   multiple return statements, multiple implementers).
//! - [`intersect`] merges requirements from multiple overridden members.
//! - [`Configuration::is_compatible`] answers "can a value with this
//!   configuration be assigned to a location with that configuration?".

use crate::configuration::{Configuration, PromotionKind, PromotionMap};
use crate::throws::Throws;
use excheck_model::{TypeId, TypeStore};

/// Union of alternative-path configurations.
///
/// Thrown types accumulate into an antichain, the undeclared bit is OR-ed,
/// a value slot is the union of the components that define it, and the
/// result counts as inferred only when every input was inferred.
pub fn union(types: &TypeStore, configurations: &[Configuration]) -> Configuration {
    let mut throws = Throws::empty();
    let mut first = true;
    for configuration in configurations {
        if first {
            throws = configuration.throws.clone();
            first = false;
        } else {
            throws.union_with(types, &configuration.throws);
        }
    }

    let mut value = PromotionMap::new();
    for kind in PromotionKind::ALL {
        let slots: Vec<Configuration> = configurations
            .iter()
            .filter_map(|configuration| configuration.value.get(kind).cloned())
            .collect();
        if !slots.is_empty() {
            value.insert(kind, union(types, &slots));
        }
    }

    Configuration::new(throws, value)
}

/// Intersection of requirement configurations.
///
/// A thrown type survives when every *other* configuration covers it
/// (declares a supertype, or admits it as an undeclared Error); the
/// undeclared bit is AND-ed; a value slot survives only when every
/// component defines it.
pub fn intersect(types: &TypeStore, configurations: &[Configuration]) -> Configuration {
    debug_assert!(
        !configurations.is_empty(),
        "intersect of zero configurations has no meaning"
    );
    if configurations.len() == 1 {
        return configurations[0].clone();
    }

    let can_throw_undeclared = configurations
        .iter()
        .all(|configuration| configuration.throws.can_throw_undeclared);
    let inferred = configurations
        .iter()
        .all(|configuration| configuration.throws.inferred);

    let mut throws = Throws::empty();
    throws.can_throw_undeclared = can_throw_undeclared;
    throws.inferred = inferred;
    for (i, configuration) in configurations.iter().enumerate() {
        for &ty in configuration.throws.thrown_types() {
            let covered_by_all_others = configurations
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .all(|(_, other)| other.throws.covers(types, ty));
            if covered_by_all_others {
                throws.insert(types, ty);
            }
        }
    }

    let mut value = PromotionMap::new();
    for kind in PromotionKind::ALL {
        if configurations
            .iter()
            .all(|configuration| configuration.value.get(kind).is_some())
        {
            let slots: Vec<Configuration> = configurations
                .iter()
                .filter_map(|configuration| configuration.value.get(kind).cloned())
                .collect();
            value.insert(kind, intersect(types, &slots));
        }
    }

    Configuration::new(throws, value)
}

impl Configuration {
    /// Can a value with this configuration be assigned to a location with
    /// `parameter`'s configuration?
    ///
    /// At `at_level == 0` the top-level throws are checked; at deeper
    /// levels they are skipped, used when only the value (not the
    /// evaluation) is transferred, e.g. when passing a function reference.
    /// Value slots are checked contravariantly: every slot the parameter
    /// declares must exist on the argument and be compatible one level
    /// down.
    pub fn is_compatible(
        &self,
        types: &TypeStore,
        parameter: &Configuration,
        at_level: u32,
    ) -> bool {
        if at_level == 0 {
            if self.throws.can_throw_undeclared
                && !parameter.throws.can_throw_undeclared
                && !parameter_admits_object(types, parameter)
            {
                return false;
            }
            for &thrown in self.throws.thrown_types() {
                if !parameter.throws.covers(types, thrown) {
                    return false;
                }
            }
        }

        for (kind, parameter_slot) in parameter.value.iter() {
            match self.value.get(kind) {
                None => return false,
                Some(argument_slot) => {
                    if !argument_slot.is_compatible(
                        types,
                        parameter_slot,
                        at_level.saturating_sub(1),
                    ) {
                        return false;
                    }
                }
            }
        }
        true
    }
}

fn parameter_admits_object(types: &TypeStore, parameter: &Configuration) -> bool {
    parameter
        .throws
        .thrown_types()
        .iter()
        .any(|&declared| types.is_assignable_to(TypeId::OBJECT, declared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use excheck_common::Interner;
    use std::sync::Arc;

    fn store() -> TypeStore {
        TypeStore::new(Arc::new(Interner::new()))
    }

    fn throws_config(types: &TypeStore, thrown: &[TypeId], undeclared: bool) -> Configuration {
        Configuration::from_throws(Throws::explicit(types, thrown.iter().copied(), undeclared))
    }

    #[test]
    fn union_of_singleton_is_identity() {
        let types = store();
        let config = throws_config(&types, &[TypeId::EXCEPTION], true);
        assert_eq!(union(&types, &[config.clone()]), config);
    }

    #[test]
    fn intersect_of_singleton_is_identity() {
        let types = store();
        let config = throws_config(&types, &[TypeId::EXCEPTION], false);
        assert_eq!(intersect(&types, &[config.clone()]), config);
    }

    #[test]
    fn union_normalizes_to_antichain() {
        let mut types = store();
        let format_exception =
            types.interface_full("FormatException", None, [TypeId::EXCEPTION], [], []);
        let a = throws_config(&types, &[format_exception], false);
        let b = throws_config(&types, &[TypeId::EXCEPTION], false);
        let merged = union(&types, &[a, b]);
        assert_eq!(merged.throws.thrown_types(), &[TypeId::EXCEPTION]);
    }

    #[test]
    fn union_is_commutative() {
        let mut types = store();
        let io = types.interface_full("IOException", None, [TypeId::EXCEPTION], [], []);
        let a = throws_config(&types, &[io], true);
        let b = throws_config(&types, &[TypeId::STATE_ERROR], false);
        assert_eq!(
            union(&types, &[a.clone(), b.clone()]),
            union(&types, &[b, a])
        );
    }

    #[test]
    fn intersect_keeps_the_more_specific_type() {
        let mut types = store();
        let format_exception =
            types.interface_full("FormatException", None, [TypeId::EXCEPTION], [], []);
        let narrow = throws_config(&types, &[format_exception], false);
        let wide = throws_config(&types, &[TypeId::EXCEPTION], false);
        let expected = throws_config(&types, &[format_exception], false);
        assert_eq!(
            intersect(&types, &[narrow.clone(), wide.clone()]),
            expected
        );
        assert_eq!(intersect(&types, &[wide, narrow]), expected);
    }

    #[test]
    fn intersect_drops_uncovered_types() {
        let mut types = store();
        let io = types.interface_full("IOException", None, [TypeId::EXCEPTION], [], []);
        let format_exception =
            types.interface_full("FormatException", None, [TypeId::EXCEPTION], [], []);
        let a = throws_config(&types, &[io], false);
        let b = throws_config(&types, &[format_exception], false);
        let merged = intersect(&types, &[a, b]);
        assert!(merged.throws.thrown_types().is_empty());
    }

    #[test]
    fn intersect_admits_errors_via_undeclared() {
        let types = store();
        let a = throws_config(&types, &[TypeId::STATE_ERROR], false);
        let b = throws_config(&types, &[], true);
        let merged = intersect(&types, &[a, b]);
        assert_eq!(merged.throws.thrown_types(), &[TypeId::STATE_ERROR]);
        assert!(!merged.throws.can_throw_undeclared);
    }

    #[test]
    fn intersect_drops_slot_missing_in_any_component() {
        let types = store();
        let with_invoke = Configuration::for_value(
            [(PromotionKind::Invoke, Configuration::empty())]
                .into_iter()
                .collect(),
        );
        let without = Configuration::empty();
        let merged = intersect(&types, &[with_invoke.clone(), without]);
        assert!(merged.invoke().is_none());

        let merged = intersect(&types, &[with_invoke.clone(), with_invoke]);
        assert!(merged.invoke().is_some());
    }

    #[test]
    fn union_keeps_slot_defined_anywhere() {
        let types = store();
        let with_await = Configuration::for_value(
            [(
                PromotionKind::Await,
                Configuration::throws_exactly(TypeId::EXCEPTION),
            )]
            .into_iter()
            .collect(),
        );
        let without = Configuration::empty();
        let merged = union(&types, &[without, with_await]);
        assert_eq!(
            merged.awaited().unwrap().throws.thrown_types(),
            &[TypeId::EXCEPTION]
        );
    }

    #[test]
    fn compat_undeclared_needs_undeclared_or_object() {
        let types = store();
        let argument = throws_config(&types, &[], true);
        let strict = throws_config(&types, &[TypeId::EXCEPTION], false);
        let lenient = throws_config(&types, &[], true);
        let object_param = throws_config(&types, &[TypeId::OBJECT], false);
        assert!(!argument.is_compatible(&types, &strict, 0));
        assert!(argument.is_compatible(&types, &lenient, 0));
        assert!(argument.is_compatible(&types, &object_param, 0));
    }

    #[test]
    fn compat_thrown_types_need_cover() {
        let mut types = store();
        let format_exception =
            types.interface_full("FormatException", None, [TypeId::EXCEPTION], [], []);
        let argument = throws_config(&types, &[format_exception], false);
        let wide = throws_config(&types, &[TypeId::EXCEPTION], false);
        let narrow = throws_config(&types, &[TypeId::STATE_ERROR], false);
        assert!(argument.is_compatible(&types, &wide, 0));
        assert!(!argument.is_compatible(&types, &narrow, 0));
    }

    #[test]
    fn compat_errors_covered_by_undeclared_parameter() {
        let types = store();
        let argument = throws_config(&types, &[TypeId::STATE_ERROR], false);
        let safe = throws_config(&types, &[], true);
        assert!(argument.is_compatible(&types, &safe, 0));
    }

    #[test]
    fn compat_level_skips_top_but_not_slots() {
        let types = store();
        let argument = Configuration::new(
            Throws::explicit(&types, [TypeId::EXCEPTION], false),
            [(
                PromotionKind::Invoke,
                Configuration::throws_exactly(TypeId::EXCEPTION),
            )]
            .into_iter()
            .collect(),
        );
        let parameter = Configuration::for_value(
            [(
                PromotionKind::Invoke,
                Configuration::from_throws(Throws::explicit(&types, [], false)),
            )]
            .into_iter()
            .collect(),
        );
        // Top-level Exception is ignored at level 1, but the invoke slot
        // still fails: it throws Exception into a neverThrows slot.
        assert!(!argument.is_compatible(&types, &parameter, 1));

        let quiet_argument = Configuration::for_value(
            [(PromotionKind::Invoke, Configuration::empty())]
                .into_iter()
                .collect(),
        );
        assert!(quiet_argument.is_compatible(&types, &parameter, 1));
    }

    #[test]
    fn compat_missing_slot_is_contravariant_failure() {
        let types = store();
        let argument = Configuration::empty();
        let parameter = Configuration::for_value(
            [(PromotionKind::Invoke, Configuration::empty())]
                .into_iter()
                .collect(),
        );
        assert!(!argument.is_compatible(&types, &parameter, 0));
    }
}
