use crate::values::MemoryLocation;
use serde::{Deserialize, Serialize};

/// Set of memory locations as produced by reach-definition and liveness analyses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSet {
    locations: Vec<MemoryLocation>,
}

impl LocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, loc: MemoryLocation) {
        if !self.contain(&loc) {
            self.locations.retain(|existing| !loc.covers(existing));
            self.locations.push(loc);
        }
    }

    /// Whether every byte of `loc` is in the set.
    pub fn contain(&self, loc: &MemoryLocation) -> bool {
        self.locations.iter().any(|existing| existing.covers(loc))
    }

    /// Whether some byte of `loc` is in the set.
    pub fn overlap(&self, loc: &MemoryLocation) -> bool {
        self.locations
            .iter()
            .any(|existing| existing.ptr == loc.ptr && existing.size != Some(0))
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemoryLocation> {
        self.locations.iter()
    }
}

impl FromIterator<MemoryLocation> for LocationSet {
    fn from_iter<I: IntoIterator<Item = MemoryLocation>>(iter: I) -> Self {
        let mut set = LocationSet::new();
        for loc in iter {
            set.insert(loc);
        }
        set
    }
}

/// Definitions reaching the end of a data-flow node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionInfo {
    /// Written on every path.
    pub must_reach: LocationSet,
    /// Written on some path.
    pub may_reach: LocationSet,
}

impl DefinitionInfo {
    pub fn new(must_reach: LocationSet, may_reach: LocationSet) -> Self {
        Self {
            must_reach,
            may_reach,
        }
    }
}

/// Locations that may be read after the loop finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSet {
    pub out: LocationSet,
}

impl LiveSet {
    pub fn new(out: LocationSet) -> Self {
        Self { out }
    }
}
