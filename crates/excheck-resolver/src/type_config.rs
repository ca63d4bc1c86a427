//! Type-configuration deriver.
//!
//! For a type, produce the value slots implied *by the type alone*:
//! function types contribute an `invoke` slot, future types an `await`
//! slot, structurally callable types (an instance `call` member) an
//! `invoke` slot through that member's declaration. Typedef aliases carry
//! their annotations onto the slot they produce.
//!
//! Everything here is type-driven and session-free: the slot throws come
//! from annotations on the alias or the `call` member, never from body
//! inference, so derivation terminates without the fixed-point engine.

use crate::annotations::declared_throws;
use crate::configuration::{Configuration, PromotionKind, PromotionMap};
use crate::throws::Throws;
use excheck_model::{Program, TypeId};

/// The value slots implied by `ty` alone.
pub fn type_configuration(program: &Program, ty: TypeId) -> PromotionMap {
    let types = &program.types;
    let mut map = PromotionMap::new();

    let future_value = types.future_value(ty);
    let function = types.as_function(ty).cloned();
    let callable = if function.is_none() {
        types.call_method(ty)
    } else {
        None
    };

    // A type that is both future-like and callable would make the alias
    // annotations ambiguous; they are dropped and only the shape drives
    // the slots.
    let ambiguous = future_value.is_some() && (function.is_some() || callable.is_some());
    let alias_throws = if ambiguous {
        Throws::empty()
    } else {
        alias_throws(program, ty)
    };

    if let Some(function) = function {
        map.insert(
            PromotionKind::Invoke,
            Configuration::new(
                alias_throws.clone(),
                type_configuration(program, function.return_type),
            ),
        );
    } else if let Some(call_member) = callable {
        let call = program.elements.get(call_member);
        let throws = if alias_throws.is_vacuous() {
            declared_throws(types, call).unwrap_or_else(Throws::empty)
        } else {
            alias_throws.clone()
        };
        let result = match call.ty {
            Some(return_type) => type_configuration(program, return_type),
            None => PromotionMap::new(),
        };
        map.insert(PromotionKind::Invoke, Configuration::new(throws, result));
    }

    if let Some(value) = future_value {
        map.insert(
            PromotionKind::Await,
            Configuration::new(alias_throws, type_configuration(program, value)),
        );
    }

    map
}

/// Annotations carried by the typedef a type was written through.
fn alias_throws(program: &Program, ty: TypeId) -> Throws {
    match program.types.alias_of(ty) {
        Some(alias) => declared_throws(&program.types, program.elements.get(alias))
            .unwrap_or_else(Throws::empty),
        None => Throws::empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excheck_model::{Annotation, ElementKind, ProgramBuilder};

    #[test]
    fn function_type_contributes_invoke_slot() {
        let mut builder = ProgramBuilder::new("package:app/app.dart");
        let fn_ty = builder.types().function_type([], TypeId::VOID);
        let program = builder.finish();
        let map = type_configuration(&program, fn_ty);
        assert!(map.get(PromotionKind::Invoke).is_some());
        assert!(map.get(PromotionKind::Await).is_none());
    }

    #[test]
    fn future_type_contributes_await_slot() {
        let mut builder = ProgramBuilder::new("package:app/app.dart");
        let fut = builder.types().future(TypeId::OBJECT);
        let program = builder.finish();
        let map = type_configuration(&program, fut);
        assert!(map.get(PromotionKind::Await).is_some());
        assert!(map.get(PromotionKind::Invoke).is_none());
    }

    #[test]
    fn aliased_function_type_carries_typedef_annotations() {
        let mut builder = ProgramBuilder::new("package:app/app.dart");
        let alias = builder.typedef("SafeCallback", vec![Annotation::Safe]);
        let fn_ty = builder.types().function_type_aliased([], TypeId::VOID, alias);
        let program = builder.finish();
        let map = type_configuration(&program, fn_ty);
        let invoke = map.get(PromotionKind::Invoke).unwrap();
        assert!(invoke.throws.can_throw_undeclared);
        assert!(!invoke.throws.inferred);
    }

    #[test]
    fn future_of_function_nests_slots() {
        let mut builder = ProgramBuilder::new("package:app/app.dart");
        let fn_ty = builder.types().function_type([], TypeId::VOID);
        let fut = builder.types().future(fn_ty);
        let program = builder.finish();
        let map = type_configuration(&program, fut);
        let awaited = map.get(PromotionKind::Await).unwrap();
        assert!(awaited.invoke().is_some());
    }

    #[test]
    fn callable_class_contributes_invoke_through_call_member() {
        let mut builder = ProgramBuilder::new("package:app/app.dart");
        let (class, class_ty) = builder.class("Runner", None);
        let call = builder.member(class, "call", ElementKind::Method, Some(TypeId::VOID));
        builder.set_metadata(call, vec![Annotation::Throws(TypeId::EXCEPTION)]);
        let program = builder.finish();
        let map = type_configuration(&program, class_ty);
        let invoke = map.get(PromotionKind::Invoke).unwrap();
        assert_eq!(invoke.throws.thrown_types(), &[TypeId::EXCEPTION]);
    }

    #[test]
    fn plain_interface_contributes_nothing() {
        let mut builder = ProgramBuilder::new("package:app/app.dart");
        let (_, class_ty) = builder.class("Plain", None);
        let program = builder.finish();
        assert!(type_configuration(&program, class_ty).is_empty());
    }
}
