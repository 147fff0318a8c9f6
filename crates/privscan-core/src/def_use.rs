use crate::{
    dataflow::LocationSet,
    instructions::InstId,
    values::{MemoryLocation, ValueId},
};
use serde::{Deserialize, Serialize};

/// Def-use summary of one loop body.
///
/// `uses` holds upward-exposed reads: locations that may be read in an iteration before that
/// iteration writes them. A location written and then read in the same iteration is not a use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefUseSet {
    explicit_accesses: Vec<MemoryLocation>,
    explicit_unknowns: Vec<InstId>,
    address_accesses: Vec<ValueId>,
    defs: LocationSet,
    may_defs: LocationSet,
    uses: LocationSet,
}

impl DefUseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_explicit_access(&mut self, loc: MemoryLocation) {
        if !self.explicit_accesses.contains(&loc) {
            self.explicit_accesses.push(loc);
        }
    }

    pub fn add_explicit_unknown(&mut self, inst: InstId) {
        if !self.explicit_unknowns.contains(&inst) {
            self.explicit_unknowns.push(inst);
        }
    }

    pub fn add_address_access(&mut self, ptr: ValueId) {
        if !self.address_accesses.contains(&ptr) {
            self.address_accesses.push(ptr);
        }
    }

    pub fn add_def(&mut self, loc: MemoryLocation) {
        self.defs.insert(loc);
    }

    pub fn add_may_def(&mut self, loc: MemoryLocation) {
        self.may_defs.insert(loc);
    }

    pub fn add_use(&mut self, loc: MemoryLocation) {
        self.uses.insert(loc);
    }

    pub fn explicit_accesses(&self) -> &[MemoryLocation] {
        &self.explicit_accesses
    }

    pub fn explicit_unknowns(&self) -> &[InstId] {
        &self.explicit_unknowns
    }

    pub fn address_accesses(&self) -> &[ValueId] {
        &self.address_accesses
    }

    pub fn has_use(&self, loc: &MemoryLocation) -> bool {
        self.uses.overlap(loc)
    }

    pub fn has_def(&self, loc: &MemoryLocation) -> bool {
        self.defs.contain(loc)
    }

    pub fn has_may_def(&self, loc: &MemoryLocation) -> bool {
        self.may_defs.overlap(loc)
    }
}
