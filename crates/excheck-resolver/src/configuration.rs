//! Configurations.
//!
//! A `Configuration` is the recursive record of throw behavior at every
//! promotion level: `throws` is what evaluating the expression may throw
//! right now; the `invoke` slot, if present, describes the value obtained
//! by calling the value; the `await` slot describes the value obtained by
//! awaiting it. The record is read coinductively - a single configuration
//! can carry both slots (a future of a function), though typed code never
//! produces that in one layer.
//!
//! Configurations are immutable values with structural equality and
//! hashing; slots share their payloads through `Arc`.

use crate::throws::Throws;
use excheck_model::{TypeId, TypeStore};
use std::sync::Arc;

/// The two ways a value can be promoted into a new configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PromotionKind {
    /// Calling the value (function types, types with an instance `call`).
    Invoke,
    /// Awaiting the value (future-like types).
    Await,
}

impl PromotionKind {
    pub const ALL: [PromotionKind; 2] = [PromotionKind::Invoke, PromotionKind::Await];
}

/// The value slots of a configuration, keyed by [`PromotionKind`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PromotionMap {
    invoke: Option<Arc<Configuration>>,
    awaited: Option<Arc<Configuration>>,
}

impl PromotionMap {
    pub fn new() -> Self {
        PromotionMap::default()
    }

    pub fn is_empty(&self) -> bool {
        self.invoke.is_none() && self.awaited.is_none()
    }

    pub fn get(&self, kind: PromotionKind) -> Option<&Configuration> {
        match kind {
            PromotionKind::Invoke => self.invoke.as_deref(),
            PromotionKind::Await => self.awaited.as_deref(),
        }
    }

    pub fn insert(&mut self, kind: PromotionKind, configuration: Configuration) {
        let slot = Arc::new(configuration);
        match kind {
            PromotionKind::Invoke => self.invoke = Some(slot),
            PromotionKind::Await => self.awaited = Some(slot),
        }
    }

    pub fn remove(&mut self, kind: PromotionKind) {
        match kind {
            PromotionKind::Invoke => self.invoke = None,
            PromotionKind::Await => self.awaited = None,
        }
    }

    /// Present slots in fixed (`invoke`, `await`) order.
    pub fn iter(&self) -> impl Iterator<Item = (PromotionKind, &Configuration)> {
        PromotionKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|configuration| (kind, configuration)))
    }

    pub fn keys(&self) -> impl Iterator<Item = PromotionKind> + '_ {
        self.iter().map(|(kind, _)| kind)
    }
}

impl FromIterator<(PromotionKind, Configuration)> for PromotionMap {
    fn from_iter<I: IntoIterator<Item = (PromotionKind, Configuration)>>(iter: I) -> Self {
        let mut map = PromotionMap::new();
        for (kind, configuration) in iter {
            map.insert(kind, configuration);
        }
        map
    }
}

/// The recursive throw-behavior record of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Configuration {
    /// What evaluating the expression may throw right now.
    pub throws: Throws,
    /// What the value does when promoted.
    pub value: PromotionMap,
}

impl Configuration {
    /// Throws nothing, promotes to nothing.
    pub fn empty() -> Self {
        Configuration {
            throws: Throws::empty(),
            value: PromotionMap::new(),
        }
    }

    pub fn new(throws: Throws, value: PromotionMap) -> Self {
        Configuration { throws, value }
    }

    pub fn from_throws(throws: Throws) -> Self {
        Configuration {
            throws,
            value: PromotionMap::new(),
        }
    }

    pub fn for_value(value: PromotionMap) -> Self {
        Configuration {
            throws: Throws::empty(),
            value,
        }
    }

    /// Throws exactly `ty`, promotes to nothing.
    pub fn throws_exactly(ty: TypeId) -> Self {
        Configuration {
            throws: Throws::of_type(ty),
            value: PromotionMap::new(),
        }
    }

    pub fn invoke(&self) -> Option<&Configuration> {
        self.value.get(PromotionKind::Invoke)
    }

    pub fn awaited(&self) -> Option<&Configuration> {
        self.value.get(PromotionKind::Await)
    }

    /// True when nothing is thrown at any reachable level.
    pub fn is_empty(&self) -> bool {
        self.throws.is_empty() && self.value.iter().all(|(_, slot)| slot.is_empty())
    }

    /// Human-readable rendering for logs and tests.
    pub fn display(&self, types: &TypeStore) -> String {
        let mut out = self.throws.display(types);
        for (kind, slot) in self.value.iter() {
            let label = match kind {
                PromotionKind::Invoke => "invoke",
                PromotionKind::Await => "await",
            };
            out.push_str(&format!(" {label} -> ({})", slot.display(types)));
        }
        out
    }
}
