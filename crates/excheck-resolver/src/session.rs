//! Fixed-point resolver session.
//!
//! A session owns two memo tables (element configurations and expression
//! configurations), a dependents graph, and a dirty set, all destroyed
//! with the session. Requests drive computation over the possibly-cyclic
//! element/expression graph:
//!
//! - a computation that reads another entry records a dependency edge;
//! - re-entering an entry that is currently being computed yields a
//!   provisional result (an empty configuration for nodes, "no
//!   information" for elements) and marks it for recomputation;
//! - after the initial demand, the settle loop recomputes dirty entries
//!   in deterministic (sorted-key) order, re-dirtying dependents whenever
//!   a cached result changes, until the tables stop moving.
//!
//! Termination: the lattice is finite-height per program, and every
//! operation is monotone once each cycle has seen its explicit anchors; a
//! centralized iteration cap guards against resolver bugs. Cancellation
//! is checked at every entry point and at settle iteration boundaries:
//! cancelled requests return `None` and drop the dirty set, cached final
//! entries stay valid.

use crate::configuration::Configuration;
use crate::element_config;
use crate::expr_config;
use crate::inheritance;
use crate::overrides::OverrideTable;
use excheck_common::limits::MAX_SETTLE_ITERATIONS;
use excheck_model::{ElementId, NodeIndex, NodeKey, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Cooperative cancellation shared with the host.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters exposed for host telemetry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub computations: u64,
    pub cache_hits: u64,
    pub provisional_results: u64,
    pub settle_iterations: u64,
}

/// Cache key: elements by identity, nodes by their stable key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum Key {
    Element(ElementId),
    Node(NodeKey),
}

#[derive(Debug, Default)]
struct SessionState {
    nodes: FxHashMap<NodeKey, Option<Configuration>>,
    node_of_key: FxHashMap<NodeKey, NodeIndex>,
    elements: FxHashMap<ElementId, Option<Configuration>>,
    dependents: FxHashMap<Key, FxHashSet<Key>>,
    dirty: FxHashSet<Key>,
    in_progress: FxHashSet<Key>,
    stack: Vec<Key>,
    stats: SessionStats,
}

impl SessionState {
    fn record_dependency(&mut self, read: Key) {
        if let Some(&consumer) = self.stack.last() {
            if consumer != read {
                self.dependents.entry(read).or_default().insert(consumer);
            }
        }
    }

    /// A computation re-entered `key` and received a provisional value:
    /// schedule both sides for recomputation. Re-dirtying the consumer
    /// matters even when `key` itself settles to its first value - the
    /// consumer cached a result derived from the provisional stand-in.
    fn mark_provisional(&mut self, key: Key) {
        self.dirty.insert(key);
        if let Some(&consumer) = self.stack.last() {
            self.dirty.insert(consumer);
        }
        self.stats.provisional_results += 1;
    }
}

/// A per-analysis resolver session over one read-only [`Program`].
pub struct ResolverSession<'a> {
    program: &'a Program,
    overrides: &'a OverrideTable,
    cancel: CancellationToken,
    state: RefCell<SessionState>,
}

impl<'a> ResolverSession<'a> {
    pub fn new(program: &'a Program, overrides: &'a OverrideTable) -> Self {
        ResolverSession {
            program,
            overrides,
            cancel: CancellationToken::new(),
            state: RefCell::new(SessionState::default()),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn program(&self) -> &'a Program {
        self.program
    }

    pub(crate) fn overrides(&self) -> &OverrideTable {
        self.overrides
    }

    pub fn stats(&self) -> SessionStats {
        self.state.borrow().stats
    }

    // =========================================================================
    // Public entry points
    // =========================================================================

    /// The configuration of an expression node, settled to a fixed point.
    pub fn configuration(&self, node: NodeIndex) -> Option<Configuration> {
        if self.check_cancelled() {
            return None;
        }
        self.demand_node(node);
        self.settle();
        if self.cancel.is_cancelled() {
            return None;
        }
        let key = self.program.arena.key(node);
        self.state.borrow().nodes.get(&key).cloned().flatten()
    }

    /// The configuration of an element, settled to a fixed point.
    pub fn element_configuration(&self, element: ElementId) -> Option<Configuration> {
        if self.check_cancelled() {
            return None;
        }
        self.demand_element(element);
        self.settle();
        if self.cancel.is_cancelled() {
            return None;
        }
        self.state.borrow().elements.get(&element).cloned().flatten()
    }

    /// The intersected configuration a member inherits from everything it
    /// overrides; `None` when it overrides nothing known.
    pub fn inherited_configuration(&self, member: ElementId) -> Option<Configuration> {
        if self.check_cancelled() {
            return None;
        }
        // First pass may observe provisional entries; settle, then replay
        // over the stabilized caches.
        inheritance::inherited_configuration(self, member);
        self.settle();
        if self.cancel.is_cancelled() {
            return None;
        }
        inheritance::inherited_configuration(self, member)
    }

    // =========================================================================
    // Demand-driven computation (crate-internal)
    // =========================================================================

    pub(crate) fn demand_node(&self, node: NodeIndex) -> Option<Configuration> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let node_key = self.program.arena.key(node);
        let key = Key::Node(node_key);
        {
            let mut state = self.state.borrow_mut();
            state.node_of_key.insert(node_key, node);
            state.record_dependency(key);
            if state.in_progress.contains(&key) {
                // Provisional result: both the re-entered entry and the
                // reader that consumed the provisional value recompute
                // once the cycle unwinds.
                state.mark_provisional(key);
                return Some(Configuration::empty());
            }
            if let Some(cached) = state.nodes.get(&node_key).cloned() {
                state.stats.cache_hits += 1;
                return cached;
            }
        }
        self.compute_node(node_key, node)
    }

    pub(crate) fn demand_element(&self, element: ElementId) -> Option<Configuration> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let key = Key::Element(element);
        {
            let mut state = self.state.borrow_mut();
            state.record_dependency(key);
            if state.in_progress.contains(&key) {
                // Recursion protection: the inner requester sees no
                // information; the outer settle loop finalizes the
                // element and re-runs the requester.
                state.mark_provisional(key);
                return None;
            }
            if let Some(cached) = state.elements.get(&element).cloned() {
                state.stats.cache_hits += 1;
                return cached;
            }
        }
        self.compute_element(element)
    }

    fn compute_node(&self, node_key: NodeKey, node: NodeIndex) -> Option<Configuration> {
        let key = Key::Node(node_key);
        self.enter(key);
        let computed = expr_config::compute(self, node);
        self.leave(key);
        let mut state = self.state.borrow_mut();
        state.stats.computations += 1;
        state.nodes.insert(node_key, computed.clone());
        computed
    }

    fn compute_element(&self, element: ElementId) -> Option<Configuration> {
        let key = Key::Element(element);
        self.enter(key);
        let computed = element_config::compute(self, element);
        self.leave(key);
        let mut state = self.state.borrow_mut();
        state.stats.computations += 1;
        state.elements.insert(element, computed.clone());
        computed
    }

    fn enter(&self, key: Key) {
        let mut state = self.state.borrow_mut();
        state.in_progress.insert(key);
        state.stack.push(key);
    }

    fn leave(&self, key: Key) {
        let mut state = self.state.borrow_mut();
        let popped = state.stack.pop();
        debug_assert_eq!(popped, Some(key), "unbalanced computation stack");
        state.in_progress.remove(&key);
    }

    // =========================================================================
    // Settle loop
    // =========================================================================

    fn settle(&self) {
        for _ in 0..MAX_SETTLE_ITERATIONS {
            if self.check_cancelled() {
                return;
            }
            let mut snapshot: Vec<Key> = {
                let mut state = self.state.borrow_mut();
                if state.dirty.is_empty() {
                    return;
                }
                state.stats.settle_iterations += 1;
                state.dirty.drain().collect()
            };
            snapshot.sort();

            for key in snapshot {
                let old = self.cached(key);
                let new = self.recompute(key);
                if new != old {
                    let mut state = self.state.borrow_mut();
                    let dependents: Vec<Key> = state
                        .dependents
                        .get(&key)
                        .map(|set| set.iter().copied().collect())
                        .unwrap_or_default();
                    state.dirty.extend(dependents);
                }
            }
        }
        warn!("settle loop exceeded iteration cap; serving last computed state");
        let mut state = self.state.borrow_mut();
        state.dirty.clear();
        debug!(stats = ?state.stats, "session state after cap");
    }

    fn cached(&self, key: Key) -> Option<Configuration> {
        let state = self.state.borrow();
        match key {
            Key::Element(element) => state.elements.get(&element).cloned().flatten(),
            Key::Node(node_key) => state.nodes.get(&node_key).cloned().flatten(),
        }
    }

    fn recompute(&self, key: Key) -> Option<Configuration> {
        match key {
            Key::Element(element) => self.compute_element(element),
            Key::Node(node_key) => {
                let node = self.state.borrow().node_of_key.get(&node_key).copied();
                match node {
                    Some(node) => self.compute_node(node_key, node),
                    None => None,
                }
            }
        }
    }

    fn check_cancelled(&self) -> bool {
        if self.cancel.is_cancelled() {
            self.state.borrow_mut().dirty.clear();
            return true;
        }
        false
    }
}
