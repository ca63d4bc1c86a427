//! Stable element identity.
//!
//! An `ElementLocation` names a program element independently of arena or
//! store indices: the defining library's URI plus the dotted path of names
//! from the library root down to the element. It is the key used by the
//! resolver's element cache and by override tables.
//!
//! Path conventions:
//! - `new` names a default (unnamed) constructor
//! - `$n` names the n-th positional parameter

use excheck_common::{Atom, Interner};
use smallvec::SmallVec;

/// Stable identity of a program element.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementLocation {
    /// URI of the defining library.
    pub library: Atom,
    /// Dotted element path, outermost first.
    pub path: SmallVec<[Atom; 4]>,
}

impl ElementLocation {
    pub fn new(library: Atom, path: impl IntoIterator<Item = Atom>) -> Self {
        ElementLocation {
            library,
            path: path.into_iter().collect(),
        }
    }

    /// Parse `uri` and a dotted path like `Outer.Member.$0`.
    pub fn parse(interner: &Interner, library: &str, path: &str) -> Self {
        ElementLocation {
            library: interner.intern(library),
            path: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(|segment| interner.intern(segment))
                .collect(),
        }
    }

    /// Extend this location with a child segment.
    pub fn child(&self, segment: Atom) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        ElementLocation {
            library: self.library,
            path,
        }
    }

    /// Render as `uri;Seg1.Seg2`.
    pub fn display(&self, interner: &Interner) -> String {
        let mut out = String::new();
        out.push_str(&interner.resolve(self.library));
        out.push(';');
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&interner.resolve(*segment));
        }
        out
    }
}
