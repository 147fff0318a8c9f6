use crate::{
    instructions::InstId,
    values::{MemoryLocation, ValueId},
    CoreError, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EstimateId(pub u32);

impl std::fmt::Display for EstimateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "em{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AliasNodeId(pub u32);

impl std::fmt::Display for AliasNodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "an{}", self.0)
    }
}

/// A memory object or sub-object. All `pointers` address the same bytes; `offset` and `size`
/// place it inside its top-level object and drive coverage queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateMemory {
    pub id: EstimateId,
    pub pointers: Vec<ValueId>,
    pub size: Option<u64>,
    pub offset: u64,
    pub parent: Option<EstimateId>,
    pub children: Vec<EstimateId>,
    pub alias_node: AliasNodeId,
}

impl EstimateMemory {
    pub fn front(&self) -> ValueId {
        self.pointers[0]
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn locations(&self) -> impl Iterator<Item = MemoryLocation> + '_ {
        self.pointers
            .iter()
            .map(move |&ptr| MemoryLocation::new(ptr, self.size))
    }

    fn byte_range(&self) -> (u64, u64) {
        let end = self
            .size
            .map_or(u64::MAX, |size| self.offset.saturating_add(size));
        (self.offset, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AliasNodeKind {
    /// Root of the tree; may alias anything.
    Top,
    Estimate,
    /// Groups accesses whose base could not be resolved.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasNode {
    pub id: AliasNodeId,
    pub kind: AliasNodeKind,
    pub parent: Option<AliasNodeId>,
    pub children: Vec<AliasNodeId>,
    pub estimates: Vec<EstimateId>,
    pub unknowns: Vec<InstId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasTree {
    estimates: Vec<EstimateMemory>,
    nodes: Vec<AliasNode>,
    top: AliasNodeId,
    by_pointer: HashMap<ValueId, Vec<EstimateId>>,
    unknowns: HashMap<InstId, AliasNodeId>,
}

impl AliasTree {
    pub fn top_level_node(&self) -> AliasNodeId {
        self.top
    }

    pub fn node(&self, id: AliasNodeId) -> &AliasNode {
        &self.nodes[id.0 as usize]
    }

    pub fn estimate(&self, id: EstimateId) -> &EstimateMemory {
        &self.estimates[id.0 as usize]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &AliasNode> {
        self.nodes.iter()
    }

    pub fn estimates(&self) -> impl Iterator<Item = &EstimateMemory> {
        self.estimates.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn alias_node(&self, em: EstimateId) -> AliasNodeId {
        self.estimate(em).alias_node
    }

    /// Smallest estimate memory starting at `loc.ptr` that spans `loc`.
    pub fn find(&self, loc: &MemoryLocation) -> Option<EstimateId> {
        let candidates = self.by_pointer.get(&loc.ptr)?;
        candidates
            .iter()
            .copied()
            .filter(|&id| MemoryLocation::new(loc.ptr, self.estimate(id).size).covers(loc))
            .min_by_key(|&id| self.estimate(id).size.unwrap_or(u64::MAX))
    }

    pub fn find_unknown(&self, inst: InstId) -> Option<AliasNodeId> {
        self.unknowns.get(&inst).copied()
    }

    pub fn top_level_parent(&self, em: EstimateId) -> EstimateId {
        let mut current = em;
        while let Some(parent) = self.estimate(current).parent {
            current = parent;
        }
        current
    }

    /// Returns whichever of `a` and `b` is an ancestor (or self) of the other.
    pub fn ancestor(&self, a: EstimateId, b: EstimateId) -> Option<EstimateId> {
        if self.is_estimate_ancestor(a, b) {
            Some(a)
        } else if self.is_estimate_ancestor(b, a) {
            Some(b)
        } else {
            None
        }
    }

    pub fn is_estimate_ancestor(&self, ancestor: EstimateId, em: EstimateId) -> bool {
        let mut current = Some(em);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.estimate(id).parent;
        }
        false
    }

    pub fn is_node_ancestor(&self, ancestor: AliasNodeId, node: AliasNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.node(id).parent;
        }
        false
    }

    /// Nodes on one root path may alias; siblings never do.
    pub fn may_alias_nodes(&self, a: AliasNodeId, b: AliasNodeId) -> bool {
        self.is_node_ancestor(a, b) || self.is_node_ancestor(b, a)
    }

    pub fn may_alias(&self, a: &MemoryLocation, b: &MemoryLocation) -> bool {
        match (self.find(a), self.find(b)) {
            (Some(ea), Some(eb)) => {
                self.may_alias_nodes(self.alias_node(ea), self.alias_node(eb))
            }
            _ => true,
        }
    }

    /// Children before parents, siblings in insertion order.
    pub fn post_order(&self) -> Vec<AliasNodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![(self.top, false)];
        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            stack.push((id, true));
            for &child in self.node(id).children.iter().rev() {
                stack.push((child, false));
            }
        }
        order
    }

    /// `node` and everything below it, pre-order.
    pub fn descendants(&self, node: AliasNodeId) -> Vec<AliasNodeId> {
        let mut result = Vec::new();
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            result.push(id);
            for &child in self.node(id).children.iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// `em` and everything below it in the estimate hierarchy, pre-order.
    pub fn estimate_descendants(&self, em: EstimateId) -> Vec<EstimateId> {
        let mut result = Vec::new();
        let mut stack = vec![em];
        while let Some(id) = stack.pop() {
            result.push(id);
            for &child in self.estimate(id).children.iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Estimate memories of `node` whose parent lies outside it.
    pub fn node_roots(&self, node: AliasNodeId) -> Vec<EstimateId> {
        self.node(node)
            .estimates
            .iter()
            .copied()
            .filter(|&em| {
                self.estimate(em)
                    .parent
                    .map_or(true, |parent| self.alias_node(parent) != node)
            })
            .collect()
    }

    /// Whether the byte ranges of `pieces` span `target` without gaps. Pieces from a different
    /// top-level object never contribute.
    pub fn cover(&self, target: EstimateId, pieces: &[EstimateId]) -> bool {
        let root = self.top_level_parent(target);
        let mut ranges: Vec<(u64, u64)> = pieces
            .iter()
            .copied()
            .filter(|&piece| piece == target || self.top_level_parent(piece) == root)
            .map(|piece| self.estimate(piece).byte_range())
            .collect();
        if ranges.is_empty() {
            return false;
        }
        ranges.sort_unstable();
        let (start, end) = self.estimate(target).byte_range();
        let mut reached = start;
        for (lo, hi) in ranges {
            if reached >= end {
                break;
            }
            if hi <= reached {
                continue;
            }
            if lo > reached {
                return false;
            }
            reached = hi;
        }
        reached >= end
    }
}

pub struct AliasTreeBuilder {
    estimates: Vec<EstimateMemory>,
    nodes: Vec<AliasNode>,
    unknowns: HashMap<InstId, AliasNodeId>,
}

impl AliasTreeBuilder {
    pub fn new() -> Self {
        Self {
            estimates: Vec::new(),
            nodes: vec![AliasNode {
                id: AliasNodeId(0),
                kind: AliasNodeKind::Top,
                parent: None,
                children: Vec::new(),
                estimates: Vec::new(),
                unknowns: Vec::new(),
            }],
            unknowns: HashMap::new(),
        }
    }

    pub fn top(&self) -> AliasNodeId {
        AliasNodeId(0)
    }

    pub fn add_node(&mut self, parent: AliasNodeId, kind: AliasNodeKind) -> Result<AliasNodeId> {
        if parent.0 as usize >= self.nodes.len() {
            return Err(CoreError::UnknownAliasNode(parent.to_string()));
        }
        if kind == AliasNodeKind::Top {
            return Err(CoreError::MalformedTree(
                "only the root may be a top node".to_string(),
            ));
        }
        let id = AliasNodeId(self.nodes.len() as u32);
        self.nodes.push(AliasNode {
            id,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            estimates: Vec::new(),
            unknowns: Vec::new(),
        });
        self.nodes[parent.0 as usize].children.push(id);
        Ok(id)
    }

    pub fn add_estimate(
        &mut self,
        node: AliasNodeId,
        pointers: Vec<ValueId>,
        size: Option<u64>,
        offset: u64,
        parent: Option<EstimateId>,
    ) -> Result<EstimateId> {
        if node.0 as usize >= self.nodes.len() {
            return Err(CoreError::UnknownAliasNode(node.to_string()));
        }
        if pointers.is_empty() {
            return Err(CoreError::MalformedTree(
                "estimate memory needs at least one pointer".to_string(),
            ));
        }
        let id = EstimateId(self.estimates.len() as u32);
        if let Some(parent) = parent {
            let Some(parent_mem) = self.estimates.get(parent.0 as usize) else {
                return Err(CoreError::UnknownEstimate(parent.to_string()));
            };
            if !self.is_node_ancestor(parent_mem.alias_node, node) {
                return Err(CoreError::MalformedTree(format!(
                    "{} lives in {} which is not an ancestor of {}",
                    parent, parent_mem.alias_node, node
                )));
            }
            self.estimates[parent.0 as usize].children.push(id);
        }
        self.estimates.push(EstimateMemory {
            id,
            pointers,
            size,
            offset,
            parent,
            children: Vec::new(),
            alias_node: node,
        });
        self.nodes[node.0 as usize].estimates.push(id);
        Ok(id)
    }

    pub fn add_unknown(&mut self, node: AliasNodeId, inst: InstId) -> Result<()> {
        if node.0 as usize >= self.nodes.len() {
            return Err(CoreError::UnknownAliasNode(node.to_string()));
        }
        self.nodes[node.0 as usize].unknowns.push(inst);
        self.unknowns.insert(inst, node);
        Ok(())
    }

    fn is_node_ancestor(&self, ancestor: AliasNodeId, node: AliasNodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.0 as usize].parent;
        }
        false
    }

    pub fn build(self) -> AliasTree {
        let mut by_pointer: HashMap<ValueId, Vec<EstimateId>> = HashMap::new();
        for em in &self.estimates {
            for &ptr in &em.pointers {
                by_pointer.entry(ptr).or_default().push(em.id);
            }
        }
        AliasTree {
            estimates: self.estimates,
            nodes: self.nodes,
            top: AliasNodeId(0),
            by_pointer,
            unknowns: self.unknowns,
        }
    }
}

impl Default for AliasTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
