//! Throw summaries.
//!
//! A `Throws` describes one level of throw behavior: the minimal set of
//! thrown types (an antichain under the subtype relation), whether
//! undeclared Errors are additionally allowed, and whether the summary was
//! inferred from a body or anchored by an explicit annotation or override
//! entry. The `inferred` flag controls precedence when summaries merge: an
//! explicit summary always wins over an inferred one at the same level.

use excheck_model::{TypeId, TypeStore};
use smallvec::SmallVec;

/// What evaluating something may throw.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Throws {
    /// Minimal thrown-type set: no element is a proper subtype of another.
    /// Kept sorted by `TypeId` so equality and hashing are structural.
    thrown: SmallVec<[TypeId; 2]>,
    /// When true, any non-Exception value (an Error) may be thrown in
    /// addition to `thrown`.
    pub can_throw_undeclared: bool,
    /// True when derived from body analysis, false when anchored by an
    /// annotation or an override entry.
    pub inferred: bool,
}

impl Throws {
    /// The inferred nothing-thrown summary: `({}, false, true)`.
    pub fn empty() -> Self {
        Throws {
            thrown: SmallVec::new(),
            can_throw_undeclared: false,
            inferred: true,
        }
    }

    /// An explicit summary, e.g. from annotations.
    pub fn explicit(
        types: &TypeStore,
        thrown: impl IntoIterator<Item = TypeId>,
        can_throw_undeclared: bool,
    ) -> Self {
        let mut result = Throws {
            thrown: SmallVec::new(),
            can_throw_undeclared,
            inferred: false,
        };
        for ty in thrown {
            result.insert(types, ty);
        }
        result
    }

    /// An inferred single-type summary, e.g. from a throw site.
    pub fn of_type(ty: TypeId) -> Self {
        Throws {
            thrown: SmallVec::from_slice(&[ty]),
            can_throw_undeclared: false,
            inferred: true,
        }
    }

    pub fn thrown_types(&self) -> &[TypeId] {
        &self.thrown
    }

    /// True when nothing is thrown and no Errors are admitted.
    pub fn is_empty(&self) -> bool {
        self.thrown.is_empty() && !self.can_throw_undeclared
    }

    /// True when this summary carries no information at all: nothing
    /// thrown, nothing admitted, and not anchored by an annotation.
    pub fn is_vacuous(&self) -> bool {
        self.is_empty() && self.inferred
    }

    /// Insert a thrown type, maintaining the antichain invariant: skip the
    /// type when a supertype is already present, drop present subtypes of
    /// the new type.
    pub fn insert(&mut self, types: &TypeStore, ty: TypeId) {
        if self
            .thrown
            .iter()
            .any(|&existing| types.is_assignable_to(ty, existing))
        {
            return;
        }
        self.thrown
            .retain(|&mut existing| !types.is_assignable_to(existing, ty));
        let position = self.thrown.partition_point(|&existing| existing < ty);
        self.thrown.insert(position, ty);
    }

    /// Does this summary permit throwing `ty`? Either a declared supertype
    /// covers it, or it is an Error and undeclared throws are allowed.
    pub fn covers(&self, types: &TypeStore, ty: TypeId) -> bool {
        self.thrown
            .iter()
            .any(|&declared| types.is_assignable_to(ty, declared))
            || (self.can_throw_undeclared && !types.is_exception_type(ty))
    }

    /// Merge another summary into this one (alternative-path union).
    pub fn union_with(&mut self, types: &TypeStore, other: &Throws) {
        for &ty in other.thrown_types() {
            self.insert(types, ty);
        }
        self.can_throw_undeclared |= other.can_throw_undeclared;
        self.inferred &= other.inferred;
    }

    /// Remove the types a catch clause handles. `None` is an untyped
    /// catch-all clause and clears everything; a typed clause removes the
    /// thrown subtypes of the caught type and clears the undeclared bit
    /// only when the clause catches `Object` itself.
    pub fn subtract_caught(&mut self, types: &TypeStore, caught: Option<TypeId>) {
        match caught {
            None => {
                self.thrown.clear();
                self.can_throw_undeclared = false;
            }
            Some(caught) => {
                self.thrown
                    .retain(|&mut thrown| !types.is_assignable_to(thrown, caught));
                if types.is_assignable_to(TypeId::OBJECT, caught) {
                    self.can_throw_undeclared = false;
                }
            }
        }
    }

    /// Human-readable rendering for logs and tests.
    pub fn display(&self, types: &TypeStore) -> String {
        let mut out = String::from("{");
        for (i, &ty) in self.thrown.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(&types.display(ty));
        }
        out.push('}');
        if self.can_throw_undeclared {
            out.push_str(" +undeclared");
        }
        if self.inferred {
            out.push_str(" (inferred)");
        }
        out
    }
}
