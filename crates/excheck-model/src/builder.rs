//! Program construction.
//!
//! `ProgramBuilder` is the hand-off surface a host front end (or a test
//! fixture) uses to assemble the arena, element graph, and type store the
//! resolver consumes. It takes care of the bookkeeping the resolver relies
//! on: stable element locations (`$n` parameters, `new` constructors),
//! parent links, unique node spans per unit, and class member lists.

use crate::annotation::Annotation;
use crate::ast::{AstArena, NodeData, NodeIndex, UnitId};
use crate::element::{Element, ElementFlags, ElementId, ElementKind, ElementStore};
use crate::location::ElementLocation;
use crate::types::{TypeId, TypeStore};
use excheck_common::{Interner, Span};
use std::sync::Arc;

/// A fully built program, read-only to the resolver.
#[derive(Debug)]
pub struct Program {
    pub interner: Arc<Interner>,
    pub types: TypeStore,
    pub elements: ElementStore,
    pub arena: AstArena,
}

/// Builder over [`Program`].
#[derive(Debug)]
pub struct ProgramBuilder {
    program: Program,
    unit: UnitId,
    /// Next synthetic span offset, per unit.
    cursors: Vec<u32>,
    closure_counter: u32,
}

impl ProgramBuilder {
    /// Start a program with one compilation unit for `library`.
    pub fn new(library: &str) -> Self {
        let interner = Arc::new(Interner::new());
        let types = TypeStore::new(Arc::clone(&interner));
        let mut arena = AstArena::new();
        let unit = arena.add_unit(interner.intern(library));
        ProgramBuilder {
            program: Program {
                interner,
                types,
                elements: ElementStore::new(),
                arena,
            },
            unit,
            cursors: vec![0],
            closure_counter: 0,
        }
    }

    pub fn finish(self) -> Program {
        self.program
    }

    pub fn types(&mut self) -> &mut TypeStore {
        &mut self.program.types
    }

    pub fn elements(&mut self) -> &mut ElementStore {
        &mut self.program.elements
    }

    pub fn interner(&self) -> &Arc<Interner> {
        &self.program.interner
    }

    pub fn current_unit(&self) -> UnitId {
        self.unit
    }

    /// Add another compilation unit and make it current.
    pub fn unit(&mut self, library: &str) -> UnitId {
        let library = self.program.interner.intern(library);
        let unit = self.program.arena.add_unit(library);
        self.cursors.push(0);
        self.unit = unit;
        unit
    }

    pub fn set_unit(&mut self, unit: UnitId) {
        self.unit = unit;
    }

    fn library_uri(&self) -> excheck_common::Atom {
        self.program.arena.unit_library(self.unit)
    }

    // =========================================================================
    // Nodes
    // =========================================================================

    /// Add a node with a fresh synthetic span (unique per unit, so node
    /// keys never collide).
    pub fn node(&mut self, data: NodeData) -> NodeIndex {
        let cursor = &mut self.cursors[self.unit.0 as usize];
        let span = Span::from_len(*cursor, 1);
        *cursor += 1;
        self.program.arena.add(self.unit, span, data)
    }

    /// Add a node at an explicit span.
    pub fn node_spanned(&mut self, span: Span, data: NodeData) -> NodeIndex {
        let cursor = &mut self.cursors[self.unit.0 as usize];
        *cursor = (*cursor).max(span.end);
        self.program.arena.add(self.unit, span, data)
    }

    pub fn set_static_type(&mut self, node: NodeIndex, ty: TypeId) {
        self.program.arena.set_static_type(node, ty);
    }

    /// `throw C()` where `C` is `ty`; the operand's static type is filled
    /// in as the host front end would.
    pub fn throw_of_type(&mut self, ty: TypeId, constructor: Option<ElementId>) -> NodeIndex {
        let operand = self.node(NodeData::InstanceCreation {
            constructor,
            args: Default::default(),
        });
        self.set_static_type(operand, ty);
        self.node(NodeData::Throw { expr: operand })
    }

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.node(NodeData::ExpressionStatement { expr })
    }

    pub fn block(&mut self, statements: impl IntoIterator<Item = NodeIndex>) -> NodeIndex {
        self.node(NodeData::Block {
            statements: statements.into_iter().collect(),
        })
    }

    pub fn identifier(&mut self, element: ElementId) -> NodeIndex {
        self.node(NodeData::Identifier {
            element: Some(element),
        })
    }

    /// `f(args...)` for a direct reference to `f`.
    pub fn call(
        &mut self,
        callee: ElementId,
        args: impl IntoIterator<Item = NodeIndex>,
    ) -> NodeIndex {
        let callee = self.identifier(callee);
        self.node(NodeData::Invocation {
            callee,
            args: args.into_iter().collect(),
        })
    }

    // =========================================================================
    // Elements
    // =========================================================================

    fn add_element(
        &mut self,
        name: &str,
        kind: ElementKind,
        location: ElementLocation,
    ) -> ElementId {
        let name = self.program.interner.intern(name);
        self.program
            .elements
            .add(Element::new(name, kind, location))
    }

    fn top_level_location(&self, name: &str) -> ElementLocation {
        ElementLocation::new(
            self.library_uri(),
            [self.program.interner.intern(name)],
        )
    }

    /// A top-level function.
    pub fn function(&mut self, name: &str, return_type: TypeId) -> ElementId {
        let location = self.top_level_location(name);
        let id = self.add_element(name, ElementKind::Function, location);
        self.program.elements.update(id, |element| {
            element.ty = Some(return_type);
        });
        id
    }

    /// A top-level variable.
    pub fn top_level_variable(&mut self, name: &str, ty: Option<TypeId>) -> ElementId {
        let location = self.top_level_location(name);
        let id = self.add_element(name, ElementKind::TopLevelVariable, location);
        self.program.elements.update(id, |element| {
            element.ty = ty;
            if ty.is_none() {
                element.flags |= ElementFlags::IMPLICIT_TYPE;
            }
        });
        id
    }

    /// A typedef carrying annotations onto the function types written
    /// through it.
    pub fn typedef(&mut self, name: &str, metadata: Vec<Annotation>) -> ElementId {
        let location = self.top_level_location(name);
        let id = self.add_element(name, ElementKind::Typedef, location);
        self.program.elements.update(id, |element| {
            element.metadata = metadata;
        });
        id
    }

    /// Declare a class: creates the interface type, the class element, and
    /// links them.
    pub fn class(&mut self, name: &str, supertype: Option<TypeId>) -> (ElementId, TypeId) {
        let ty = self.program.types.interface(name, supertype);
        let location = self.top_level_location(name);
        let id = self.add_element(name, ElementKind::Class, location);
        self.program.elements.update(id, |element| {
            element.ty = Some(ty);
        });
        self.program.types.set_declaration(ty, id);
        (id, ty)
    }

    /// Declare a class with a full hierarchy (interfaces, mixins, and a
    /// mixin `on` clause).
    pub fn class_full(
        &mut self,
        name: &str,
        kind: ElementKind,
        supertype: Option<TypeId>,
        interfaces: impl IntoIterator<Item = TypeId>,
        mixins: impl IntoIterator<Item = TypeId>,
        on_types: impl IntoIterator<Item = TypeId>,
    ) -> (ElementId, TypeId) {
        let ty = self
            .program
            .types
            .interface_full(name, supertype, interfaces, mixins, on_types);
        let location = self.top_level_location(name);
        let id = self.add_element(name, kind, location);
        self.program.elements.update(id, |element| {
            element.ty = Some(ty);
        });
        self.program.types.set_declaration(ty, id);
        (id, ty)
    }

    /// A class member: method, getter, setter, or field.
    pub fn member(
        &mut self,
        class: ElementId,
        name: &str,
        kind: ElementKind,
        ty: Option<TypeId>,
    ) -> ElementId {
        let location = self
            .program
            .elements
            .get(class)
            .location
            .child(self.program.interner.intern(name));
        let id = self.add_element(name, kind, location);
        self.program.elements.update(id, |element| {
            element.ty = ty;
            element.enclosing = Some(class);
        });
        self.program.elements.update(class, |element| {
            element.members.push(id);
        });
        if name == "call" && kind == ElementKind::Method {
            if let Some(class_ty) = self.program.elements.get(class).ty {
                self.program.types.set_call_method(class_ty, id);
            }
        }
        id
    }

    /// A constructor; `None` names the default constructor (`new`).
    pub fn constructor(&mut self, class: ElementId, name: Option<&str>) -> ElementId {
        let segment = name.unwrap_or("new");
        let location = self
            .program
            .elements
            .get(class)
            .location
            .child(self.program.interner.intern(segment));
        let id = self.add_element(segment, ElementKind::Constructor, location);
        let class_ty = self.program.elements.get(class).ty;
        self.program.elements.update(id, |element| {
            element.enclosing = Some(class);
            element.ty = class_ty;
        });
        self.program.elements.update(class, |element| {
            element.members.push(id);
        });
        id
    }

    /// A positional parameter (`$n` in the owner's location).
    pub fn parameter(&mut self, owner: ElementId, name: &str, ty: TypeId) -> ElementId {
        let index = self.program.elements.get(owner).parameters.len();
        let segment = format!("${index}");
        let location = self
            .program
            .elements
            .get(owner)
            .location
            .child(self.program.interner.intern(&segment));
        let id = self.add_element(name, ElementKind::Parameter, location);
        self.program.elements.update(id, |element| {
            element.ty = Some(ty);
            element.enclosing = Some(owner);
        });
        self.program.elements.update(owner, |element| {
            element.parameters.push(id);
        });
        id
    }

    /// A local variable inside `owner`.
    pub fn local_variable(&mut self, owner: ElementId, name: &str, ty: Option<TypeId>) -> ElementId {
        let location = self
            .program
            .elements
            .get(owner)
            .location
            .child(self.program.interner.intern(name));
        let id = self.add_element(name, ElementKind::LocalVariable, location);
        self.program.elements.update(id, |element| {
            element.ty = ty;
            element.enclosing = Some(owner);
            if ty.is_none() {
                element.flags |= ElementFlags::IMPLICIT_TYPE;
            }
        });
        id
    }

    /// The synthetic element behind a function literal.
    pub fn closure_element(&mut self, return_type: TypeId) -> ElementId {
        let segment = format!("<closure_{}>", self.closure_counter);
        self.closure_counter += 1;
        let location = self.top_level_location(&segment);
        let id = self.add_element(&segment, ElementKind::Function, location);
        self.program.elements.update(id, |element| {
            element.ty = Some(return_type);
            element.flags |= ElementFlags::SYNTHETIC;
        });
        id
    }

    /// Synthetic accessor pair forwarding to a field.
    pub fn synthetic_getter(&mut self, class: ElementId, field: ElementId) -> ElementId {
        let field_name = self.program.elements.get(field).name;
        let name = self.program.interner.resolve(field_name).to_string();
        let location = self
            .program
            .elements
            .get(class)
            .location
            .child(self.program.interner.intern(&format!("{name}=get")));
        let id = self.add_element(&name, ElementKind::Getter, location);
        let field_ty = self.program.elements.get(field).ty;
        self.program.elements.update(id, |element| {
            element.enclosing = Some(class);
            element.field = Some(field);
            element.ty = field_ty;
            element.flags |= ElementFlags::SYNTHETIC;
        });
        self.program.elements.update(class, |element| {
            element.members.push(id);
        });
        id
    }

    // =========================================================================
    // Attachment
    // =========================================================================

    pub fn set_element_span(&mut self, element: ElementId, span: Span) {
        self.program.elements.update(element, |e| e.span = span);
    }

    pub fn set_metadata(&mut self, element: ElementId, metadata: Vec<Annotation>) {
        self.program.elements.update(element, |e| e.metadata = metadata);
    }

    pub fn add_flags(&mut self, element: ElementId, flags: ElementFlags) {
        self.program.elements.update(element, |e| e.flags |= flags);
    }

    pub fn set_body(&mut self, element: ElementId, body: NodeIndex) {
        self.program.elements.update(element, |e| e.body = Some(body));
    }

    pub fn set_initializer(&mut self, element: ElementId, initializer: NodeIndex) {
        self.program
            .elements
            .update(element, |e| e.initializer = Some(initializer));
    }
}
