//! String interning for names that are compared and hashed constantly.
//!
//! Element names, library URIs, and type names flow through every cache in
//! the resolver. Interning turns them into 4-byte `Atom` handles with O(1)
//! equality and hashing.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::Arc;

/// An interned string handle.
///
/// Atoms are only meaningful together with the `Interner` that produced
/// them. Equality on `Atom` is equality on the interned string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty string, pre-interned by every `Interner`.
    pub const EMPTY: Atom = Atom(0);
}

/// Interns strings and hands out `Atom` handles.
///
/// Interning is append-only; an `Atom` stays valid for the lifetime of the
/// interner. Interior mutability keeps `intern` usable behind shared
/// references, matching how the stores that embed it are passed around.
#[derive(Debug, Default)]
pub struct Interner {
    map: RefCell<FxHashMap<Arc<str>, Atom>>,
    strings: RefCell<Vec<Arc<str>>>,
}

impl Interner {
    pub fn new() -> Self {
        let interner = Interner {
            map: RefCell::new(FxHashMap::default()),
            strings: RefCell::new(Vec::new()),
        };
        let empty = interner.intern("");
        debug_assert_eq!(empty, Atom::EMPTY);
        interner
    }

    /// Intern a string, returning its atom. Idempotent.
    pub fn intern(&self, text: &str) -> Atom {
        if let Some(&atom) = self.map.borrow().get(text) {
            return atom;
        }
        let mut strings = self.strings.borrow_mut();
        let atom = Atom(strings.len() as u32);
        let shared: Arc<str> = Arc::from(text);
        strings.push(Arc::clone(&shared));
        self.map.borrow_mut().insert(shared, atom);
        atom
    }

    /// Resolve an atom back to its string.
    ///
    /// Returns an owning handle so callers do not hold the interner borrowed.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let strings = self.strings.borrow();
        Arc::clone(&strings[atom.0 as usize])
    }

    /// Look up an already-interned string without interning it.
    pub fn lookup(&self, text: &str) -> Option<Atom> {
        self.map.borrow().get(text).copied()
    }

    /// Number of interned strings (including the pre-interned empty string).
    pub fn len(&self) -> usize {
        self.strings.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let interner = Interner::new();
        let a = interner.intern("Exception");
        let b = interner.intern("Exception");
        assert_eq!(a, b);
        assert_eq!(&*interner.resolve(a), "Exception");
    }

    #[test]
    fn distinct_strings_get_distinct_atoms() {
        let interner = Interner::new();
        let a = interner.intern("FormatException");
        let b = interner.intern("IOException");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_string_is_pre_interned() {
        let interner = Interner::new();
        assert_eq!(interner.intern(""), Atom::EMPTY);
    }
}
