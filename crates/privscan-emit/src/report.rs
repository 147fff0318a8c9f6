//! Serializable view of a function's classification, keyed by source names instead of arena ids.

use privscan_analysis::{
    AliasTrait, DependenceRecord, DependencyDescriptor, PrivateInfo, Statistics,
};
use privscan_core::{AliasTree, EstimateId, Function, InstId, Operation, RegionId};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct FunctionReport {
    pub function: String,
    pub loops: Vec<LoopReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoopReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    pub depth: usize,
    pub nodes: Vec<NodeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    pub node: String,
    pub traits: DependencyDescriptor,
    pub memories: Vec<MemoryReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unknowns: Vec<UnknownReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemoryReport {
    pub name: String,
    pub size: Option<u64>,
    pub traits: DependencyDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependence: Option<DependenceRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnknownReport {
    pub access: String,
    pub traits: DependencyDescriptor,
}

impl FunctionReport {
    pub fn new(
        function: &Function,
        info: &PrivateInfo,
        include_unknowns: bool,
        include_statistics: bool,
    ) -> Self {
        let loops = match &function.alias_tree {
            Some(tree) => info
                .iter()
                .map(|(region, set)| {
                    let nodes = set
                        .iter()
                        .filter(|alias_trait| alias_trait.node != tree.top_level_node())
                        .map(|alias_trait| {
                            NodeReport::new(function, tree, alias_trait, include_unknowns)
                        })
                        .collect();
                    LoopReport::new(function, info, region, nodes, include_statistics)
                })
                .collect(),
            None => Vec::new(),
        };
        Self {
            function: function.name.clone(),
            loops,
            statistics: include_statistics.then(|| *info.statistics()),
        }
    }
}

impl LoopReport {
    fn new(
        function: &Function,
        info: &PrivateInfo,
        region: RegionId,
        nodes: Vec<NodeReport>,
        include_statistics: bool,
    ) -> Self {
        let region_info = function.regions.get(region);
        Self {
            name: region_info.name.clone(),
            start: region_info.start.as_ref().map(ToString::to_string),
            depth: region_info.depth,
            nodes,
            statistics: if include_statistics {
                info.loop_statistics(region).copied()
            } else {
                None
            },
        }
    }
}

impl NodeReport {
    fn new(
        function: &Function,
        tree: &AliasTree,
        alias_trait: &AliasTrait,
        include_unknowns: bool,
    ) -> Self {
        let memories = alias_trait
            .memories
            .iter()
            .map(|memory| MemoryReport {
                name: memory_name(function, tree, memory.memory),
                size: tree.estimate(memory.memory).size,
                traits: memory.descriptor,
                dependence: memory.dependence.clone(),
            })
            .collect();
        let unknowns = if include_unknowns {
            alias_trait
                .unknowns
                .iter()
                .map(|unknown| UnknownReport {
                    access: unknown_name(function, unknown.inst),
                    traits: unknown.descriptor,
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            node: alias_trait.node.to_string(),
            traits: alias_trait.descriptor,
            memories,
            unknowns,
        }
    }
}

/// Source name of the first pointer that addresses `em`.
pub fn memory_name(function: &Function, tree: &AliasTree, em: EstimateId) -> String {
    function.value(tree.estimate(em).front()).name.clone()
}

/// `<name, size>` with `?` for an unknown extent.
pub fn memory_label(function: &Function, tree: &AliasTree, em: EstimateId) -> String {
    match tree.estimate(em).size {
        Some(size) => format!("<{}, {}>", memory_name(function, tree, em), size),
        None => format!("<{}, ?>", memory_name(function, tree, em)),
    }
}

/// Callee of an unknown call, otherwise the instruction itself.
pub fn unknown_name(function: &Function, inst: InstId) -> String {
    match &function.instruction(inst).op {
        Operation::Call { callee, .. } => callee.clone(),
        _ => inst.to_string(),
    }
}
