//! Syntax node arena.
//!
//! The resolver consumes a pre-typed AST: every node was produced by the
//! host front end with its span, its compilation unit, its parent link,
//! and (for expressions that need one) its static type already filled in.
//! Nodes are addressed by `NodeIndex` inside the arena and by `NodeKey`
//! (unit identity, offset, length, kind tag) in the resolver's memo
//! tables, which must survive arena rebuilds.

use crate::element::ElementId;
use crate::types::TypeId;
use excheck_common::{Atom, Span};
use smallvec::SmallVec;

/// Handle to a node in the [`AstArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub u32);

/// Handle to a compilation unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

/// Syntactic payload of a node.
///
/// Expressions reference resolved elements where the host front end could
/// resolve them; `None` means resolution failed and the resolver treats
/// the node as contributing no information.
#[derive(Clone, Debug)]
pub enum NodeData {
    // =========================================================================
    // Expressions
    // =========================================================================
    NullLiteral,
    BoolLiteral(bool),
    IntLiteral(i64),
    StringLiteral(Atom),
    This,
    Super,
    /// `e is T` / `e is! T`
    IsTest { expr: NodeIndex },
    TypeLiteral(TypeId),
    Parenthesized { expr: NodeIndex },
    /// Named-argument wrapper around an argument expression.
    NamedArgument { name: Atom, expr: NodeIndex },
    /// A resolved reference: variable read, getter access, function
    /// tear-off.
    Identifier { element: Option<ElementId> },
    PropertyAccess {
        target: Option<NodeIndex>,
        element: Option<ElementId>,
    },
    ConstructorReference { element: Option<ElementId> },
    /// Function or method call; the callee expression's configuration
    /// carries the `invoke` slot.
    Invocation {
        callee: NodeIndex,
        args: SmallVec<[NodeIndex; 4]>,
    },
    /// `a[i]`, resolved to the index operator member.
    Index {
        target: NodeIndex,
        index: NodeIndex,
        element: Option<ElementId>,
    },
    InstanceCreation {
        constructor: Option<ElementId>,
        args: SmallVec<[NodeIndex; 4]>,
    },
    Binary {
        left: NodeIndex,
        right: NodeIndex,
        /// Resolved operator method; `None` for primitive operators.
        operator: Option<ElementId>,
    },
    Await { expr: NodeIndex },
    Assignment {
        target: NodeIndex,
        value: NodeIndex,
        /// Resolved setter when the target is a property.
        setter: Option<ElementId>,
    },
    Conditional {
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: NodeIndex,
    },
    SwitchExpression {
        subject: NodeIndex,
        arms: SmallVec<[NodeIndex; 4]>,
    },
    /// A function literal. The synthetic element carries the body and the
    /// async flag; `parameter` is the static parameter element the literal
    /// flows into, when it appears directly as an argument.
    FunctionExpression {
        element: ElementId,
        parameter: Option<ElementId>,
    },
    Cast { expr: NodeIndex, ty: TypeId },
    /// Postfix `!`.
    NonNullAssert { expr: NodeIndex },
    Throw { expr: NodeIndex },
    Rethrow,
    /// `a ?? b`
    IfNull { left: NodeIndex, right: NodeIndex },
    /// Destructuring pattern assignment; conservatively throws StateError.
    PatternAssignment { value: NodeIndex },

    // =========================================================================
    // Statements
    // =========================================================================
    Block { statements: SmallVec<[NodeIndex; 8]> },
    ExpressionStatement { expr: NodeIndex },
    If {
        condition: NodeIndex,
        then_branch: NodeIndex,
        else_branch: Option<NodeIndex>,
    },
    While { condition: NodeIndex, body: NodeIndex },
    Return { expr: Option<NodeIndex> },
    Try {
        body: NodeIndex,
        catches: SmallVec<[NodeIndex; 2]>,
        finally: Option<NodeIndex>,
    },
    CatchClause {
        /// `on E catch (e)`; `None` for an untyped catch-all clause.
        exception_type: Option<TypeId>,
        parameter: Option<ElementId>,
        body: NodeIndex,
    },
    /// Local variable declaration; the initializer hangs off the element.
    VariableDeclaration { element: ElementId },
    SwitchStatement {
        subject: NodeIndex,
        cases: SmallVec<[NodeIndex; 4]>,
    },
}

/// Fieldless kind tag, part of the stable [`NodeKey`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    NullLiteral,
    BoolLiteral,
    IntLiteral,
    StringLiteral,
    This,
    Super,
    IsTest,
    TypeLiteral,
    Parenthesized,
    NamedArgument,
    Identifier,
    PropertyAccess,
    ConstructorReference,
    Invocation,
    Index,
    InstanceCreation,
    Binary,
    Await,
    Assignment,
    Conditional,
    SwitchExpression,
    FunctionExpression,
    Cast,
    NonNullAssert,
    Throw,
    Rethrow,
    IfNull,
    PatternAssignment,
    Block,
    ExpressionStatement,
    If,
    While,
    Return,
    Try,
    CatchClause,
    VariableDeclaration,
    SwitchStatement,
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeData::NullLiteral => NodeKind::NullLiteral,
            NodeData::BoolLiteral(_) => NodeKind::BoolLiteral,
            NodeData::IntLiteral(_) => NodeKind::IntLiteral,
            NodeData::StringLiteral(_) => NodeKind::StringLiteral,
            NodeData::This => NodeKind::This,
            NodeData::Super => NodeKind::Super,
            NodeData::IsTest { .. } => NodeKind::IsTest,
            NodeData::TypeLiteral(_) => NodeKind::TypeLiteral,
            NodeData::Parenthesized { .. } => NodeKind::Parenthesized,
            NodeData::NamedArgument { .. } => NodeKind::NamedArgument,
            NodeData::Identifier { .. } => NodeKind::Identifier,
            NodeData::PropertyAccess { .. } => NodeKind::PropertyAccess,
            NodeData::ConstructorReference { .. } => NodeKind::ConstructorReference,
            NodeData::Invocation { .. } => NodeKind::Invocation,
            NodeData::Index { .. } => NodeKind::Index,
            NodeData::InstanceCreation { .. } => NodeKind::InstanceCreation,
            NodeData::Binary { .. } => NodeKind::Binary,
            NodeData::Await { .. } => NodeKind::Await,
            NodeData::Assignment { .. } => NodeKind::Assignment,
            NodeData::Conditional { .. } => NodeKind::Conditional,
            NodeData::SwitchExpression { .. } => NodeKind::SwitchExpression,
            NodeData::FunctionExpression { .. } => NodeKind::FunctionExpression,
            NodeData::Cast { .. } => NodeKind::Cast,
            NodeData::NonNullAssert { .. } => NodeKind::NonNullAssert,
            NodeData::Throw { .. } => NodeKind::Throw,
            NodeData::Rethrow => NodeKind::Rethrow,
            NodeData::IfNull { .. } => NodeKind::IfNull,
            NodeData::PatternAssignment { .. } => NodeKind::PatternAssignment,
            NodeData::Block { .. } => NodeKind::Block,
            NodeData::ExpressionStatement { .. } => NodeKind::ExpressionStatement,
            NodeData::If { .. } => NodeKind::If,
            NodeData::While { .. } => NodeKind::While,
            NodeData::Return { .. } => NodeKind::Return,
            NodeData::Try { .. } => NodeKind::Try,
            NodeData::CatchClause { .. } => NodeKind::CatchClause,
            NodeData::VariableDeclaration { .. } => NodeKind::VariableDeclaration,
            NodeData::SwitchStatement { .. } => NodeKind::SwitchStatement,
        }
    }

    /// Is this node an expression (as opposed to a statement or clause)?
    pub fn is_expression(&self) -> bool {
        !matches!(
            self,
            NodeData::Block { .. }
                | NodeData::ExpressionStatement { .. }
                | NodeData::If { .. }
                | NodeData::While { .. }
                | NodeData::Return { .. }
                | NodeData::Try { .. }
                | NodeData::CatchClause { .. }
                | NodeData::VariableDeclaration { .. }
                | NodeData::SwitchStatement { .. }
        )
    }

    /// Direct child nodes, in syntactic order.
    pub fn children(&self) -> SmallVec<[NodeIndex; 4]> {
        let mut out = SmallVec::new();
        match self {
            NodeData::NullLiteral
            | NodeData::BoolLiteral(_)
            | NodeData::IntLiteral(_)
            | NodeData::StringLiteral(_)
            | NodeData::This
            | NodeData::Super
            | NodeData::TypeLiteral(_)
            | NodeData::Identifier { .. }
            | NodeData::ConstructorReference { .. }
            | NodeData::Rethrow
            | NodeData::FunctionExpression { .. }
            | NodeData::VariableDeclaration { .. } => {}
            NodeData::IsTest { expr }
            | NodeData::Parenthesized { expr }
            | NodeData::NamedArgument { expr, .. }
            | NodeData::Await { expr }
            | NodeData::Cast { expr, .. }
            | NodeData::NonNullAssert { expr }
            | NodeData::Throw { expr }
            | NodeData::ExpressionStatement { expr } => out.push(*expr),
            NodeData::PropertyAccess { target, .. } => out.extend(*target),
            NodeData::Invocation { callee, args } => {
                out.push(*callee);
                out.extend(args.iter().copied());
            }
            NodeData::Index { target, index, .. } => {
                out.push(*target);
                out.push(*index);
            }
            NodeData::InstanceCreation { args, .. } => out.extend(args.iter().copied()),
            NodeData::Binary { left, right, .. } => {
                out.push(*left);
                out.push(*right);
            }
            NodeData::Assignment { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            NodeData::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                out.push(*then_branch);
                out.push(*else_branch);
            }
            NodeData::SwitchExpression { subject, arms } => {
                out.push(*subject);
                out.extend(arms.iter().copied());
            }
            NodeData::IfNull { left, right } => {
                out.push(*left);
                out.push(*right);
            }
            NodeData::PatternAssignment { value } => out.push(*value),
            NodeData::Block { statements } => out.extend(statements.iter().copied()),
            NodeData::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                out.push(*then_branch);
                out.extend(*else_branch);
            }
            NodeData::While { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            NodeData::Return { expr } => out.extend(*expr),
            NodeData::Try {
                body,
                catches,
                finally,
            } => {
                out.push(*body);
                out.extend(catches.iter().copied());
                out.extend(*finally);
            }
            NodeData::CatchClause { body, .. } => out.push(*body),
            NodeData::SwitchStatement { subject, cases } => {
                out.push(*subject);
                out.extend(cases.iter().copied());
            }
        }
        out
    }
}

/// A node in the arena.
#[derive(Clone, Debug)]
pub struct Node {
    pub data: NodeData,
    pub span: Span,
    pub unit: UnitId,
    pub parent: Option<NodeIndex>,
    /// Static type of the expression, where the resolver needs one
    /// (throw operands, casts).
    pub static_type: Option<TypeId>,
}

/// Stable memo-table key for a node: unit identity, offset, length, kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey {
    pub unit: UnitId,
    pub span: Span,
    pub kind: NodeKind,
}

/// Arena of syntax nodes plus the compilation-unit table.
#[derive(Debug, Default)]
pub struct AstArena {
    nodes: Vec<Node>,
    units: Vec<Atom>,
}

impl AstArena {
    pub fn new() -> Self {
        AstArena::default()
    }

    pub fn add_unit(&mut self, library: Atom) -> UnitId {
        let id = UnitId(self.units.len() as u32);
        self.units.push(library);
        id
    }

    pub fn unit_library(&self, unit: UnitId) -> Atom {
        self.units[unit.0 as usize]
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Add a node and link its children's parent pointers to it.
    pub fn add(&mut self, unit: UnitId, span: Span, data: NodeData) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        for child in data.children() {
            self.nodes[child.0 as usize].parent = Some(index);
        }
        self.nodes.push(Node {
            data,
            span,
            unit,
            parent: None,
            static_type: None,
        });
        index
    }

    pub fn set_static_type(&mut self, index: NodeIndex, ty: TypeId) {
        self.nodes[index.0 as usize].static_type = Some(ty);
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0 as usize)
    }

    pub fn key(&self, index: NodeIndex) -> NodeKey {
        let node = &self.nodes[index.0 as usize];
        NodeKey {
            unit: node.unit,
            span: node.span,
            kind: node.data.kind(),
        }
    }

    pub fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.nodes.get(index.0 as usize).and_then(|node| node.parent)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes of a unit, in creation order.
    pub fn unit_nodes(&self, unit: UnitId) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.unit == unit)
            .map(|(i, _)| NodeIndex(i as u32))
    }
}
