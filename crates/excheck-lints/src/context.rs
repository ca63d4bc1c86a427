//! Shared lint plumbing.
//!
//! The drivers all need the same two walks: from a node up to the element
//! whose body contains it (crossing detached initializer roots back into
//! their declaring statements), and the catch clauses passed on the way
//! up, which extend what the enclosing function permits.

use excheck_common::{Diagnostic, Span};
use excheck_model::{
    ElementId, ElementKind, NodeData, NodeIndex, Program, TypeId, UnitId,
};
use excheck_resolver::ResolverSession;
use rustc_hash::FxHashMap;

/// One catch clause passed while walking out of a node: the caught type,
/// or `None` for an untyped catch-all clause.
pub type CaughtType = Option<TypeId>;

/// Shared state for one lint run.
pub struct LintContext<'a> {
    pub program: &'a Program,
    pub session: &'a ResolverSession<'a>,
    /// Body/initializer root node -> declaring element.
    body_owners: FxHashMap<NodeIndex, ElementId>,
    /// Local variable element -> its declaration statement.
    declaration_sites: FxHashMap<ElementId, NodeIndex>,
}

impl<'a> LintContext<'a> {
    pub fn new(program: &'a Program, session: &'a ResolverSession<'a>) -> Self {
        let mut body_owners = FxHashMap::default();
        for (id, element) in program.elements.iter() {
            if let Some(body) = element.body {
                body_owners.insert(body, id);
            }
            if let Some(initializer) = element.initializer {
                body_owners.insert(initializer, id);
            }
        }

        let mut declaration_sites = FxHashMap::default();
        for unit in 0..program.arena.unit_count() {
            for index in program.arena.unit_nodes(UnitId(unit as u32)) {
                if let Some(node) = program.arena.get(index) {
                    if let NodeData::VariableDeclaration { element } = &node.data {
                        declaration_sites.insert(*element, index);
                    }
                }
            }
        }

        LintContext {
            program,
            session,
            body_owners,
            declaration_sites,
        }
    }

    /// The executable whose evaluation contains `node`, plus the catch
    /// clauses protecting the node on the way out.
    ///
    /// Returns `None` for code with no evaluating function: top-level and
    /// field initializers, and the bodies of `late` initializers (those
    /// surface through the variable's configuration instead).
    pub fn enclosing_function(
        &self,
        node: NodeIndex,
    ) -> Option<(ElementId, Vec<CaughtType>)> {
        let arena = &self.program.arena;
        let mut caught: Vec<CaughtType> = Vec::new();
        let mut current = node;

        loop {
            let parent = arena.parent(current);
            match parent {
                Some(parent_index) => {
                    if let Some(parent_node) = arena.get(parent_index) {
                        if let NodeData::Try { body, catches, .. } = &parent_node.data {
                            // Only the protected body is covered by the
                            // clauses; catch and finally bodies are not.
                            if *body == current {
                                for &catch_index in catches.iter() {
                                    if let Some(catch_node) = arena.get(catch_index) {
                                        if let NodeData::CatchClause {
                                            exception_type, ..
                                        } = &catch_node.data
                                        {
                                            caught.push(*exception_type);
                                        }
                                    }
                                }
                            }
                        }
                    }
                    current = parent_index;
                }
                None => {
                    // At a root: either an element body or a detached
                    // initializer.
                    let owner = *self.body_owners.get(&current)?;
                    let element = self.program.elements.get(owner);
                    if element.kind.is_executable() {
                        return Some((owner, caught));
                    }
                    if element.kind.is_variable() {
                        if element.is_late() {
                            // Deferred evaluation; checked at access sites
                            // through the variable's configuration.
                            return None;
                        }
                        // Eager local initializers evaluate inside the
                        // declaring statement; continue from there.
                        if element.kind == ElementKind::LocalVariable {
                            if let Some(&site) = self.declaration_sites.get(&owner) {
                                current = site;
                                continue;
                            }
                        }
                    }
                    return None;
                }
            }
        }
    }

    pub fn diagnostic(&self, span: Span, library: excheck_common::Atom, message: String, code: u32) -> Diagnostic {
        Diagnostic::error(
            self.program.interner.resolve(library).to_string(),
            span,
            message,
            code,
        )
    }

    pub fn node_span(&self, node: NodeIndex) -> Span {
        self.program
            .arena
            .get(node)
            .map(|n| n.span)
            .unwrap_or_else(Span::dummy)
    }

    pub fn unit_library(&self, unit: UnitId) -> excheck_common::Atom {
        self.program.arena.unit_library(unit)
    }
}
