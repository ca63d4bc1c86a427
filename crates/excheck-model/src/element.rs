//! Program elements.
//!
//! Elements are the semantic declarations the resolver computes
//! configurations for: functions, methods, accessors, constructors,
//! variables, parameters, classes, and typedefs. The host front end builds
//! the graph; the core reads it.

use crate::annotation::Annotation;
use crate::ast::NodeIndex;
use crate::location::ElementLocation;
use crate::types::TypeId;
use bitflags::bitflags;
use excheck_common::{Atom, Span};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Handle to an element in the [`ElementStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Class,
    Mixin,
    Typedef,
    Function,
    Method,
    Getter,
    Setter,
    Constructor,
    Field,
    TopLevelVariable,
    LocalVariable,
    Parameter,
}

impl ElementKind {
    /// Executables get their body throws wrapped under `invoke` (and
    /// `await` when asynchronous); accessors stay at access level.
    pub fn is_executable(self) -> bool {
        matches!(
            self,
            ElementKind::Function
                | ElementKind::Method
                | ElementKind::Getter
                | ElementKind::Setter
                | ElementKind::Constructor
        )
    }

    pub fn is_accessor(self) -> bool {
        matches!(self, ElementKind::Getter | ElementKind::Setter)
    }

    pub fn is_variable(self) -> bool {
        matches!(
            self,
            ElementKind::Field
                | ElementKind::TopLevelVariable
                | ElementKind::LocalVariable
                | ElementKind::Parameter
        )
    }
}

bitflags! {
    /// Modifier bits on an element.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ElementFlags: u16 {
        const STATIC = 1 << 0;
        const ASYNC = 1 << 1;
        const LATE = 1 << 2;
        const ABSTRACT = 1 << 3;
        /// Host-synthesized (implicit accessors, default constructors).
        const SYNTHETIC = 1 << 4;
        /// Variable declared without a type annotation.
        const IMPLICIT_TYPE = 1 << 5;
    }
}

/// A program element.
#[derive(Clone, Debug)]
pub struct Element {
    pub name: Atom,
    pub kind: ElementKind,
    pub location: ElementLocation,
    /// Span of the declaring name, for diagnostics on the element itself.
    pub span: Span,
    pub flags: ElementFlags,
    /// Metadata in declaration order.
    pub metadata: Vec<Annotation>,
    /// Return type for executables, declared type for variables, aliased
    /// type for typedefs, interface type for classes/mixins.
    pub ty: Option<TypeId>,
    /// Executable body node.
    pub body: Option<NodeIndex>,
    /// Variable initializer node.
    pub initializer: Option<NodeIndex>,
    /// Enclosing class for members; enclosing executable for locals.
    pub enclosing: Option<ElementId>,
    pub parameters: SmallVec<[ElementId; 4]>,
    /// Backing field for a synthetic property accessor.
    pub field: Option<ElementId>,
    /// Instance and static members, for classes and mixins.
    pub members: Vec<ElementId>,
}

impl Element {
    pub fn new(name: Atom, kind: ElementKind, location: ElementLocation) -> Self {
        Element {
            name,
            kind,
            location,
            span: Span::dummy(),
            flags: ElementFlags::default(),
            metadata: Vec::new(),
            ty: None,
            body: None,
            initializer: None,
            enclosing: None,
            parameters: SmallVec::new(),
            field: None,
            members: Vec::new(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(ElementFlags::STATIC)
    }

    pub fn is_async(&self) -> bool {
        self.flags.contains(ElementFlags::ASYNC)
    }

    pub fn is_late(&self) -> bool {
        self.flags.contains(ElementFlags::LATE)
    }

    pub fn library(&self) -> Atom {
        self.location.library
    }
}

/// Append-only element storage, indexed by location for override lookups.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
    by_location: FxHashMap<ElementLocation, ElementId>,
}

impl ElementStore {
    pub fn new() -> Self {
        ElementStore::default()
    }

    pub fn add(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.elements.len() as u32);
        self.by_location.insert(element.location.clone(), id);
        self.elements.push(element);
        id
    }

    pub fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0 as usize]
    }

    /// Patch an element after creation (bodies and members are typically
    /// attached once their nodes exist).
    pub fn update(&mut self, id: ElementId, patch: impl FnOnce(&mut Element)) {
        patch(&mut self.elements[id.0 as usize]);
    }

    pub fn by_location(&self, location: &ElementLocation) -> Option<ElementId> {
        self.by_location.get(location).copied()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.elements
            .iter()
            .enumerate()
            .map(|(i, element)| (ElementId(i as u32), element))
    }
}
