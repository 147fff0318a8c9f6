use crate::dependence::DependenceRecord;
use bitflags::bitflags;
use indexmap::IndexMap;
use privscan_core::{AliasNodeId, EstimateId, InstId};
use serde::{Serialize, Serializer};
use std::fmt;

bitflags! {
    /// Categories a consumer reads off a classified piece of memory.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TraitFlags: u16 {
        const NO_ACCESS = 1 << 0;
        const READONLY = 1 << 1;
        const SHARED = 1 << 2;
        const PRIVATE = 1 << 3;
        const FIRST_PRIVATE = 1 << 4;
        const SECOND_TO_LAST_PRIVATE = 1 << 5;
        const LAST_PRIVATE = 1 << 6;
        const DYNAMIC_PRIVATE = 1 << 7;
        const FLOW = 1 << 8;
        const ANTI = 1 << 9;
        const OUTPUT = 1 << 10;
        const ADDRESS_ACCESS = 1 << 11;
        const EXPLICIT_ACCESS = 1 << 12;

        const DEPENDENCY = Self::FLOW.bits() | Self::ANTI.bits() | Self::OUTPUT.bits();
        const ANY_PRIVATE = Self::PRIVATE.bits()
            | Self::FIRST_PRIVATE.bits()
            | Self::SECOND_TO_LAST_PRIVATE.bits()
            | Self::LAST_PRIVATE.bits()
            | Self::DYNAMIC_PRIVATE.bits();
        /// Facts about the memory that survive any reclassification.
        const MARKERS = Self::ADDRESS_ACCESS.bits() | Self::EXPLICIT_ACCESS.bits();
    }
}

impl TraitFlags {
    /// Single categories in the order they are reported, with their report keywords.
    pub const CATEGORIES: [(TraitFlags, &'static str); 13] = [
        (TraitFlags::NO_ACCESS, "no access"),
        (TraitFlags::READONLY, "read only"),
        (TraitFlags::SHARED, "shared"),
        (TraitFlags::PRIVATE, "private"),
        (TraitFlags::FIRST_PRIVATE, "first private"),
        (TraitFlags::SECOND_TO_LAST_PRIVATE, "second to last private"),
        (TraitFlags::LAST_PRIVATE, "last private"),
        (TraitFlags::DYNAMIC_PRIVATE, "dynamic private"),
        (TraitFlags::FLOW, "flow"),
        (TraitFlags::ANTI, "anti"),
        (TraitFlags::OUTPUT, "output"),
        (TraitFlags::ADDRESS_ACCESS, "address access"),
        (TraitFlags::EXPLICIT_ACCESS, "explicit access"),
    ];

    pub fn keywords(&self) -> Vec<&'static str> {
        Self::CATEGORIES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, keyword)| *keyword)
            .collect()
    }
}

/// Decoded classification of one alias node, one estimate memory, or one unknown access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DependencyDescriptor {
    flags: TraitFlags,
}

impl DependencyDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_flags(flags: TraitFlags) -> Self {
        Self { flags }
    }

    pub fn flags(&self) -> TraitFlags {
        self.flags
    }

    /// Whether every category in `flags` is present.
    pub fn is(&self, flags: TraitFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn is_any(&self, flags: TraitFlags) -> bool {
        self.flags.intersects(flags)
    }

    pub fn set(&mut self, flags: TraitFlags) {
        self.flags.insert(flags);
    }

    pub fn unset(&mut self, flags: TraitFlags) {
        self.flags.remove(flags);
    }

    /// Replaces every category by flow, anti and output. Markers are kept.
    pub fn set_dependency(&mut self) {
        self.flags = (self.flags & TraitFlags::MARKERS) | TraitFlags::DEPENDENCY;
    }

    pub fn is_dependency(&self) -> bool {
        self.flags.intersects(TraitFlags::DEPENDENCY)
    }

    pub fn is_private(&self) -> bool {
        self.flags.intersects(TraitFlags::ANY_PRIVATE)
    }
}

impl fmt::Display for DependencyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.flags.keywords().join(", "))
    }
}

impl Serialize for DependencyDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.flags.keywords())
    }
}

/// Result for one estimate memory attributed to an alias node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateMemoryTrait {
    pub memory: EstimateId,
    pub descriptor: DependencyDescriptor,
    /// Present when the loop recorded a dependence on this memory or a piece of it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependence: Option<DependenceRecord>,
}

/// Result for one unknown memory access attributed to an alias node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownMemoryTrait {
    pub inst: InstId,
    pub descriptor: DependencyDescriptor,
}

/// Result for one alias node: the node-level summary and its constituents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AliasTrait {
    pub node: AliasNodeId,
    pub descriptor: DependencyDescriptor,
    pub memories: Vec<EstimateMemoryTrait>,
    pub unknowns: Vec<UnknownMemoryTrait>,
}

impl AliasTrait {
    pub fn new(node: AliasNodeId, descriptor: DependencyDescriptor) -> Self {
        Self {
            node,
            descriptor,
            memories: Vec::new(),
            unknowns: Vec::new(),
        }
    }

    pub fn memory(&self, em: EstimateId) -> Option<&EstimateMemoryTrait> {
        self.memories.iter().find(|m| m.memory == em)
    }

    pub fn unknown(&self, inst: InstId) -> Option<&UnknownMemoryTrait> {
        self.unknowns.iter().find(|u| u.inst == inst)
    }

    /// Forces the node and everything attributed to it to a full dependence.
    pub fn set_dependency(&mut self) {
        self.descriptor.set_dependency();
        for memory in &mut self.memories {
            memory.descriptor.set_dependency();
        }
        for unknown in &mut self.unknowns {
            unknown.descriptor.set_dependency();
        }
    }
}

/// Classification of every alias node a loop touches, in the order nodes were finalized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencySet {
    traits: IndexMap<AliasNodeId, AliasTrait>,
}

impl DependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, alias_trait: AliasTrait) {
        self.traits.insert(alias_trait.node, alias_trait);
    }

    pub(crate) fn get_mut(&mut self, node: AliasNodeId) -> Option<&mut AliasTrait> {
        self.traits.get_mut(&node)
    }

    pub fn get(&self, node: AliasNodeId) -> Option<&AliasTrait> {
        self.traits.get(&node)
    }

    pub fn contains(&self, node: AliasNodeId) -> bool {
        self.traits.contains_key(&node)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasTrait> {
        self.traits.values()
    }

    pub fn len(&self) -> usize {
        self.traits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// Descriptor recorded for `em` in whichever node it was attributed to.
    pub fn memory(&self, em: EstimateId) -> Option<&EstimateMemoryTrait> {
        self.traits.values().find_map(|t| t.memory(em))
    }

    pub fn unknown(&self, inst: InstId) -> Option<&UnknownMemoryTrait> {
        self.traits.values().find_map(|t| t.unknown(inst))
    }
}

impl Serialize for DependencySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.traits.values())
    }
}
