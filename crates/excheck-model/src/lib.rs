//! Program model consumed by the excheck configuration resolver.
//!
//! The resolver analyzes a *pre-typed* program: a host front end (parser and
//! semantic resolver, outside this workspace) produces an AST arena, an
//! element graph, and a type oracle, then hands them to the resolver
//! read-only. This crate defines that hand-off surface:
//!
//! - `TypeStore`/`TypeId` - nominal type oracle with subtype queries and the
//!   Exception/Error split
//! - `ElementStore`/`ElementId` - program elements with annotations, flags,
//!   bodies, and class hierarchies
//! - `AstArena`/`NodeIndex` - syntax nodes with parent links and stable
//!   cache keys
//! - `ElementLocation` - stable element identity for caches and override
//!   tables
//! - `ProgramBuilder` - the construction API a host (or a test fixture)
//!   uses to populate all of the above

pub mod annotation;
pub use annotation::Annotation;

pub mod location;
pub use location::ElementLocation;

pub mod types;
pub use types::{FunctionData, InterfaceData, TypeData, TypeId, TypeStore};

pub mod element;
pub use element::{Element, ElementFlags, ElementId, ElementKind, ElementStore};

pub mod ast;
pub use ast::{AstArena, Node, NodeData, NodeIndex, NodeKey, NodeKind, UnitId};

pub mod builder;
pub use builder::{Program, ProgramBuilder};
