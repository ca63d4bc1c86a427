//! Type oracle.
//!
//! The core never resolves types itself; it consumes a store the host
//! front end populated. The store answers the queries the resolver needs:
//! covariant assignability, the Exception/Error split, and the structural
//! shape queries (function, future, callable-with-`call`) that drive the
//! type-configuration deriver.
//!
//! Thrown values split into two disjoint subtrees: *Exceptions* are the
//! types assignable to the `Exception` marker; every other throwable below
//! `Object` is an *Error* and is permitted by default under `safe`.

use crate::element::ElementId;
use excheck_common::{Atom, Interner};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// Handle to a type in the [`TypeStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The bottom type.
    pub const NEVER: TypeId = TypeId(0);
    /// The untyped top.
    pub const DYNAMIC: TypeId = TypeId(1);
    pub const VOID: TypeId = TypeId(2);
    /// Top of the non-nullable hierarchy.
    pub const OBJECT: TypeId = TypeId(3);
    pub const NULL: TypeId = TypeId(4);
    /// The common supertype of all function types.
    pub const FUNCTION: TypeId = TypeId(5);
    /// Root of the Exception subtree.
    pub const EXCEPTION: TypeId = TypeId(6);
    /// Root of the Error subtree.
    pub const ERROR: TypeId = TypeId(7);
    pub const TYPE_ERROR: TypeId = TypeId(8);
    pub const STATE_ERROR: TypeId = TypeId(9);
    pub const NO_SUCH_METHOD_ERROR: TypeId = TypeId(10);
}

/// A nominal interface/class/mixin type.
#[derive(Clone, Debug)]
pub struct InterfaceData {
    pub name: Atom,
    /// `None` only for `Object` and `Null`.
    pub supertype: Option<TypeId>,
    pub interfaces: SmallVec<[TypeId; 2]>,
    pub mixins: SmallVec<[TypeId; 2]>,
    /// Mixin superclass constraints (`on` clause). Walked for inherited
    /// configurations but does not induce subtyping.
    pub on_types: SmallVec<[TypeId; 2]>,
    /// Instance `call` member, if the type is structurally callable.
    pub call_method: Option<ElementId>,
    /// The class/mixin element declaring this type.
    pub declaration: Option<ElementId>,
}

/// A structural function type.
#[derive(Clone, Debug)]
pub struct FunctionData {
    pub params: SmallVec<[TypeId; 4]>,
    pub return_type: TypeId,
    /// Typedef element this type was written through, if any. Annotations
    /// on the alias feed the derived invoke/await throws.
    pub alias: Option<ElementId>,
}

#[derive(Clone, Debug)]
pub enum TypeData {
    Never,
    Dynamic,
    Void,
    Interface(InterfaceData),
    Function(FunctionData),
    Future { value: TypeId },
    FutureOr { value: TypeId },
    Nullable { inner: TypeId },
    /// Generic type parameters are not configured; they only need identity.
    TypeParameter { name: Atom },
}

/// Append-only store of types with the subtype oracle.
#[derive(Debug)]
pub struct TypeStore {
    types: Vec<TypeData>,
    interner: Arc<Interner>,
}

impl TypeStore {
    pub fn new(interner: Arc<Interner>) -> Self {
        let mut store = TypeStore {
            types: Vec::new(),
            interner,
        };
        store.push(TypeData::Never);
        store.push(TypeData::Dynamic);
        store.push(TypeData::Void);
        store.push_interface("Object", None);
        store.push_interface("Null", None);
        store.push_interface("Function", Some(TypeId::OBJECT));
        store.push_interface("Exception", Some(TypeId::OBJECT));
        store.push_interface("Error", Some(TypeId::OBJECT));
        store.push_interface("TypeError", Some(TypeId::ERROR));
        store.push_interface("StateError", Some(TypeId::ERROR));
        store.push_interface("NoSuchMethodError", Some(TypeId::ERROR));
        store
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }

    fn push_interface(&mut self, name: &str, supertype: Option<TypeId>) -> TypeId {
        let name = self.interner.intern(name);
        self.push(TypeData::Interface(InterfaceData {
            name,
            supertype,
            interfaces: SmallVec::new(),
            mixins: SmallVec::new(),
            on_types: SmallVec::new(),
            call_method: None,
            declaration: None,
        }))
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    // =========================================================================
    // Construction (host front end / fixtures)
    // =========================================================================

    /// Declare a nominal type with just a superclass.
    pub fn interface(&mut self, name: &str, supertype: Option<TypeId>) -> TypeId {
        let supertype = supertype.or(Some(TypeId::OBJECT));
        self.push_interface(name, supertype)
    }

    /// Declare a nominal type with its full hierarchy.
    pub fn interface_full(
        &mut self,
        name: &str,
        supertype: Option<TypeId>,
        interfaces: impl IntoIterator<Item = TypeId>,
        mixins: impl IntoIterator<Item = TypeId>,
        on_types: impl IntoIterator<Item = TypeId>,
    ) -> TypeId {
        let name = self.interner.intern(name);
        self.push(TypeData::Interface(InterfaceData {
            name,
            supertype: supertype.or(Some(TypeId::OBJECT)),
            interfaces: interfaces.into_iter().collect(),
            mixins: mixins.into_iter().collect(),
            on_types: on_types.into_iter().collect(),
            call_method: None,
            declaration: None,
        }))
    }

    pub fn function_type(
        &mut self,
        params: impl IntoIterator<Item = TypeId>,
        return_type: TypeId,
    ) -> TypeId {
        self.push(TypeData::Function(FunctionData {
            params: params.into_iter().collect(),
            return_type,
            alias: None,
        }))
    }

    pub fn function_type_aliased(
        &mut self,
        params: impl IntoIterator<Item = TypeId>,
        return_type: TypeId,
        alias: ElementId,
    ) -> TypeId {
        self.push(TypeData::Function(FunctionData {
            params: params.into_iter().collect(),
            return_type,
            alias: Some(alias),
        }))
    }

    pub fn future(&mut self, value: TypeId) -> TypeId {
        self.push(TypeData::Future { value })
    }

    pub fn future_or(&mut self, value: TypeId) -> TypeId {
        self.push(TypeData::FutureOr { value })
    }

    pub fn nullable(&mut self, inner: TypeId) -> TypeId {
        self.push(TypeData::Nullable { inner })
    }

    pub fn type_parameter(&mut self, name: &str) -> TypeId {
        let name = self.interner.intern(name);
        self.push(TypeData::TypeParameter { name })
    }

    /// Attach an instance `call` member to a declared interface.
    pub fn set_call_method(&mut self, ty: TypeId, member: ElementId) {
        if let TypeData::Interface(data) = &mut self.types[ty.0 as usize] {
            data.call_method = Some(member);
        }
    }

    /// Link an interface back to its declaring class/mixin element.
    pub fn set_declaration(&mut self, ty: TypeId, declaration: ElementId) {
        if let TypeData::Interface(data) = &mut self.types[ty.0 as usize] {
            data.declaration = Some(declaration);
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get(&self, id: TypeId) -> &TypeData {
        &self.types[id.0 as usize]
    }

    pub fn as_interface(&self, id: TypeId) -> Option<&InterfaceData> {
        match self.get(id) {
            TypeData::Interface(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_function(&self, id: TypeId) -> Option<&FunctionData> {
        match self.get(id) {
            TypeData::Function(data) => Some(data),
            _ => None,
        }
    }

    /// The value type of `Future<T>` / `FutureOr<T>`.
    pub fn future_value(&self, id: TypeId) -> Option<TypeId> {
        match self.get(id) {
            TypeData::Future { value } | TypeData::FutureOr { value } => Some(*value),
            _ => None,
        }
    }

    /// Typedef alias element of a function type, if it was written through one.
    pub fn alias_of(&self, id: TypeId) -> Option<ElementId> {
        match self.get(id) {
            TypeData::Function(data) => data.alias,
            _ => None,
        }
    }

    /// Declaring class element for a nominal type.
    pub fn declaration_of(&self, id: TypeId) -> Option<ElementId> {
        self.as_interface(id).and_then(|data| data.declaration)
    }

    /// Find the instance `call` member of `id`, searching the superclass
    /// chain (structural callability is inherited).
    pub fn call_method(&self, id: TypeId) -> Option<ElementId> {
        let mut current = Some(id);
        let mut visited = FxHashSet::default();
        while let Some(ty) = current {
            if !visited.insert(ty) {
                return None;
            }
            let data = self.as_interface(ty)?;
            if let Some(member) = data.call_method {
                return Some(member);
            }
            current = data.supertype;
        }
        None
    }

    /// Is `id` in the Exception subtree?
    ///
    /// Thrown values that are not Exceptions are Errors, which `safe`
    /// permits by default.
    pub fn is_exception_type(&self, id: TypeId) -> bool {
        self.is_assignable_to(id, TypeId::EXCEPTION)
    }

    /// Covariant assignability: can a value of `source` flow into a
    /// location of `target`?
    pub fn is_assignable_to(&self, source: TypeId, target: TypeId) -> bool {
        let mut visited = FxHashSet::default();
        self.is_subtype(source, target, &mut visited)
    }

    fn is_subtype(
        &self,
        source: TypeId,
        target: TypeId,
        in_progress: &mut FxHashSet<(TypeId, TypeId)>,
    ) -> bool {
        if source == target || target == TypeId::DYNAMIC || target == TypeId::VOID {
            return true;
        }
        if source == TypeId::NEVER {
            return true;
        }
        // Path-scoped guard: a pair re-entered on the current derivation
        // path is a malformed cyclic hierarchy and does not hold; the same
        // pair on a sibling path is re-derived normally.
        if !in_progress.insert((source, target)) {
            return false;
        }
        let result = self.subtype_structural(source, target, in_progress);
        in_progress.remove(&(source, target));
        result
    }

    fn subtype_structural(
        &self,
        source: TypeId,
        target: TypeId,
        visited: &mut FxHashSet<(TypeId, TypeId)>,
    ) -> bool {
        match (self.get(source), self.get(target)) {
            (_, TypeData::Nullable { inner }) => {
                let inner = *inner;
                match self.get(source) {
                    TypeData::Nullable { inner: source_inner } => {
                        self.is_subtype(*source_inner, inner, visited)
                    }
                    _ => source == TypeId::NULL || self.is_subtype(source, inner, visited),
                }
            }
            (TypeData::Nullable { .. }, _) => false,
            (_, TypeData::FutureOr { value }) => {
                let value = *value;
                match self.get(source) {
                    TypeData::Future { value: sv } | TypeData::FutureOr { value: sv } => {
                        self.is_subtype(*sv, value, visited)
                    }
                    _ => self.is_subtype(source, value, visited),
                }
            }
            (TypeData::FutureOr { value }, _) => {
                // FutureOr<T> <= S requires both Future<T> <= S and T <= S.
                let value = *value;
                let future_side = match self.get(target) {
                    TypeData::Future { value: tv } => self.is_subtype(value, *tv, visited),
                    _ => target == TypeId::OBJECT,
                };
                future_side && self.is_subtype(value, target, visited)
            }
            (TypeData::Future { value: sv }, TypeData::Future { value: tv }) => {
                self.is_subtype(*sv, *tv, visited)
            }
            (TypeData::Function(sf), TypeData::Function(tf)) => {
                sf.params.len() == tf.params.len()
                    && self.is_subtype(sf.return_type, tf.return_type, visited)
                    && sf
                        .params
                        .iter()
                        .zip(tf.params.iter())
                        .all(|(sp, tp)| self.is_subtype(*tp, *sp, visited))
            }
            (TypeData::Function(_), _) => {
                target == TypeId::OBJECT || target == TypeId::FUNCTION
            }
            (TypeData::Interface(data), _) => {
                if target == TypeId::OBJECT {
                    // Null is the one nominal type outside the Object tree.
                    return source != TypeId::NULL;
                }
                let data = data.clone();
                data.supertype
                    .into_iter()
                    .chain(data.interfaces)
                    .chain(data.mixins)
                    .any(|super_ty| self.is_subtype(super_ty, target, visited))
            }
            (TypeData::TypeParameter { .. }, _) => target == TypeId::OBJECT,
            (TypeData::Future { .. }, _) => target == TypeId::OBJECT,
            (TypeData::Dynamic, _) => target == TypeId::OBJECT,
            (TypeData::Never, _) | (TypeData::Void, _) => false,
        }
    }

    /// Human-readable rendering for diagnostics and logs.
    pub fn display(&self, id: TypeId) -> String {
        match self.get(id) {
            TypeData::Never => "Never".to_string(),
            TypeData::Dynamic => "dynamic".to_string(),
            TypeData::Void => "void".to_string(),
            TypeData::Interface(data) => self.interner.resolve(data.name).to_string(),
            TypeData::Function(data) => {
                format!("{} Function(...)", self.display(data.return_type))
            }
            TypeData::Future { value } => format!("Future<{}>", self.display(*value)),
            TypeData::FutureOr { value } => format!("FutureOr<{}>", self.display(*value)),
            TypeData::Nullable { inner } => format!("{}?", self.display(*inner)),
            TypeData::TypeParameter { name } => self.interner.resolve(*name).to_string(),
        }
    }
}
