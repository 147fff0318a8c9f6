//! Working state for classifying a single loop.
//!
//! Trait entries live in an arena and are referred to by index. An entry starts in the list of
//! the alias node its estimate memory belongs to and travels towards the root as nodes are
//! finalized. When one entry is folded into another it keeps a forwarding link, so the
//! explicit-access index stays valid no matter how entries are merged or moved.

use crate::{
    dependence::DependenceMap,
    errors::{PrivateError, Result},
    statistics::Statistics,
    traits::{TraitId, TraitSet},
};
use indexmap::IndexMap;
use privscan_core::{
    AliasNodeId, AliasTree, DefUseSet, DefinitionInfo, EstimateId, Function, InstId, LiveSet,
    LoopRegion, MemoryLocation, RegionId,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TraitEntryId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnknownEntryId(pub usize);

#[derive(Debug, Clone)]
pub struct TraitEntry {
    pub memory: EstimateId,
    pub value: TraitSet,
    forward: Option<TraitEntryId>,
}

#[derive(Debug, Clone)]
pub struct UnknownEntry {
    pub inst: InstId,
    /// Alias node the unknown access was first attributed to.
    pub node: AliasNodeId,
    pub value: TraitSet,
}

pub struct ClassificationContext<'a> {
    pub function: &'a Function,
    pub tree: &'a AliasTree,
    pub region: &'a LoopRegion,
    pub def_use: &'a DefUseSet,
    pub live: &'a LiveSet,
    /// Definitions reaching the backward branch.
    pub latch_defs: &'a DefinitionInfo,
    /// Definitions reaching the loop exit.
    pub exit_defs: &'a DefinitionInfo,
    pub deps: DependenceMap,
    pub statistics: Statistics,
    entries: Vec<TraitEntry>,
    unknowns: Vec<UnknownEntry>,
    explicit: IndexMap<EstimateId, TraitEntryId>,
    explicit_unknowns: IndexMap<InstId, UnknownEntryId>,
    node_traits: HashMap<AliasNodeId, Vec<TraitEntryId>>,
    node_unknowns: HashMap<AliasNodeId, Vec<UnknownEntryId>>,
}

impl<'a> ClassificationContext<'a> {
    /// Gathers every collaborator result the loop needs. A missing one is a broken contract
    /// with the upstream analyses.
    pub fn new(function: &'a Function, tree: &'a AliasTree, region_id: RegionId) -> Result<Self> {
        let region = function.regions.get(region_id);
        let def_use = function.def_use(region_id).ok_or_else(|| {
            debug_assert!(false, "def-use summary must be computed for {}", region.name);
            PrivateError::MissingDefUse { region: region_id }
        })?;
        let live = function.live(region_id).ok_or_else(|| {
            debug_assert!(false, "live memory must be computed for {}", region.name);
            PrivateError::MissingLive { region: region_id }
        })?;
        let latch_defs = function.reach(region.latch).ok_or_else(|| {
            debug_assert!(false, "reach definitions must be computed for {}", region.latch);
            PrivateError::MissingReach {
                region: region_id,
                node: region.latch.to_string(),
            }
        })?;
        let exit_defs = function.reach(region.exit).ok_or_else(|| {
            debug_assert!(false, "reach definitions must be computed for {}", region.exit);
            PrivateError::MissingReach {
                region: region_id,
                node: region.exit.to_string(),
            }
        })?;
        Ok(Self {
            function,
            tree,
            region,
            def_use,
            live,
            latch_defs,
            exit_defs,
            deps: DependenceMap::new(),
            statistics: Statistics::default(),
            entries: Vec::new(),
            unknowns: Vec::new(),
            explicit: IndexMap::new(),
            explicit_unknowns: IndexMap::new(),
            node_traits: HashMap::new(),
            node_unknowns: HashMap::new(),
        })
    }

    pub fn estimate(&self, loc: &MemoryLocation) -> Result<EstimateId> {
        self.tree.find(loc).ok_or_else(|| {
            debug_assert!(false, "no estimate memory for {}", loc);
            PrivateError::MissingEstimate {
                region: self.region.id,
                location: loc.to_string(),
            }
        })
    }

    /// Follows forwarding links to the entry that currently holds the value.
    pub fn resolve(&self, id: TraitEntryId) -> TraitEntryId {
        let mut current = id;
        while let Some(next) = self.entries[current.0].forward {
            current = next;
        }
        current
    }

    pub fn entry(&self, id: TraitEntryId) -> &TraitEntry {
        &self.entries[self.resolve(id).0]
    }

    pub fn entry_mut(&mut self, id: TraitEntryId) -> &mut TraitEntry {
        let id = self.resolve(id);
        &mut self.entries[id.0]
    }

    pub fn new_entry(&mut self, memory: EstimateId, value: TraitSet) -> TraitEntryId {
        let id = TraitEntryId(self.entries.len());
        self.entries.push(TraitEntry {
            memory,
            value,
            forward: None,
        });
        id
    }

    /// Narrows `into` by the value of `from` and retires `from`.
    pub fn fold(&mut self, from: TraitEntryId, into: TraitEntryId) {
        let from = self.resolve(from);
        let into = self.resolve(into);
        if from == into {
            return;
        }
        let value = self.entries[from.0].value;
        self.entries[into.0].value &= value;
        self.entries[from.0].forward = Some(into);
    }

    pub fn explicit_entry(&self, em: EstimateId) -> Option<TraitEntryId> {
        self.explicit.get(&em).map(|&id| self.resolve(id))
    }

    /// Whether `id` holds an explicit access the loop makes to memory of `node`.
    pub fn is_explicit_in(&self, id: TraitEntryId, node: AliasNodeId) -> bool {
        let id = self.resolve(id);
        self.explicit
            .iter()
            .any(|(&em, &entry)| self.resolve(entry) == id && self.tree.alias_node(em) == node)
    }

    /// Entry tracking explicit accesses to `em`, created as `NoAccess` in the list of the
    /// alias node `em` belongs to.
    pub fn explicit_entry_or_insert(&mut self, em: EstimateId) -> TraitEntryId {
        if let Some(id) = self.explicit_entry(em) {
            return id;
        }
        let node = self.tree.alias_node(em);
        let id = self.new_entry(em, TraitSet::NO_ACCESS);
        self.explicit.insert(em, id);
        self.node_traits.entry(node).or_default().push(id);
        id
    }

    /// Explicitly accessed estimate memories whose access is more than an address escape.
    pub fn explicitly_accessed(&self) -> impl Iterator<Item = EstimateId> + '_ {
        self.explicit
            .iter()
            .filter(|(_, id)| !self.entry(**id).value.is(TraitId::NoAccess))
            .map(|(&em, _)| em)
    }

    pub fn new_unknown(&mut self, inst: InstId, node: AliasNodeId, value: TraitSet) -> UnknownEntryId {
        let id = UnknownEntryId(self.unknowns.len());
        self.unknowns.push(UnknownEntry { inst, node, value });
        self.explicit_unknowns.insert(inst, id);
        self.node_unknowns.entry(node).or_default().push(id);
        id
    }

    pub fn unknown(&self, id: UnknownEntryId) -> &UnknownEntry {
        &self.unknowns[id.0]
    }

    pub fn unknown_mut(&mut self, id: UnknownEntryId) -> &mut UnknownEntry {
        &mut self.unknowns[id.0]
    }

    pub fn explicit_unknown(&self, inst: InstId) -> Option<UnknownEntryId> {
        self.explicit_unknowns.get(&inst).copied()
    }

    pub fn node_traits(&self, node: AliasNodeId) -> &[TraitEntryId] {
        self.node_traits.get(&node).map_or(&[], Vec::as_slice)
    }

    pub fn node_unknowns(&self, node: AliasNodeId) -> &[UnknownEntryId] {
        self.node_unknowns.get(&node).map_or(&[], Vec::as_slice)
    }

    pub fn take_node_traits(&mut self, node: AliasNodeId) -> Vec<TraitEntryId> {
        self.node_traits.remove(&node).unwrap_or_default()
    }

    pub fn take_node_unknowns(&mut self, node: AliasNodeId) -> Vec<UnknownEntryId> {
        self.node_unknowns.remove(&node).unwrap_or_default()
    }

    pub fn set_node_traits(&mut self, node: AliasNodeId, entries: Vec<TraitEntryId>) {
        self.node_traits.insert(node, entries);
    }

    pub fn set_node_unknowns(&mut self, node: AliasNodeId, entries: Vec<UnknownEntryId>) {
        self.node_unknowns.insert(node, entries);
    }
}
