//! Override table.
//!
//! Externally provided configurations keyed by element location. The
//! resolver consults the table before anything else: entries are returned
//! verbatim, beating annotations and inference. Loading the YAML files
//! that feed the table lives in `excheck-overrides`; layering is
//! expressed through insertion order (later inserts win).

use crate::configuration::Configuration;
use excheck_model::ElementLocation;
use indexmap::IndexMap;

/// Configurations pinned from outside the analyzed code.
#[derive(Clone, Debug, Default)]
pub struct OverrideTable {
    entries: IndexMap<ElementLocation, Configuration>,
}

impl OverrideTable {
    pub fn new() -> Self {
        OverrideTable::default()
    }

    /// Insert an entry; replaces any earlier entry for the same location,
    /// which is how layered override files express precedence.
    pub fn insert(&mut self, location: ElementLocation, configuration: Configuration) {
        self.entries.insert(location, configuration);
    }

    pub fn get(&self, location: &ElementLocation) -> Option<&Configuration> {
        self.entries.get(location)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ElementLocation, &Configuration)> {
        self.entries.iter()
    }

    /// Merge another table into this one; the other table's entries win.
    pub fn extend(&mut self, other: OverrideTable) {
        for (location, configuration) in other.entries {
            self.entries.insert(location, configuration);
        }
    }
}
