use crate::{
    block::{BlockId, DfNodeId},
    values::SourceLocation,
    CoreError, Result,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(pub u32);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "loop{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopRegion {
    pub id: RegionId,
    pub name: String,
    pub header: BlockId,
    pub blocks: BTreeSet<BlockId>,
    /// Data-flow node right before the backward branch.
    pub latch: DfNodeId,
    /// Data-flow node of the iteration that leaves the loop.
    pub exit: DfNodeId,
    /// Nesting depth; outermost loops have depth 1.
    pub depth: usize,
    pub start: Option<SourceLocation>,
    pub parent: Option<RegionId>,
    pub children: Vec<RegionId>,
}

impl LoopRegion {
    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.contains(&block)
    }
}

/// Loop nest of one function. The function region itself is implicit: its children are
/// `top_level`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegionTree {
    loops: Vec<LoopRegion>,
    top_level: Vec<RegionId>,
}

impl RegionTree {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_loop(
        &mut self,
        name: impl Into<String>,
        parent: Option<RegionId>,
        header: BlockId,
        blocks: BTreeSet<BlockId>,
        latch: DfNodeId,
        exit: DfNodeId,
        start: Option<SourceLocation>,
    ) -> Result<RegionId> {
        let name = name.into();
        if !blocks.contains(&header) {
            return Err(CoreError::MalformedRegion(format!(
                "header {} of {} is not one of its blocks",
                header, name
            )));
        }
        let depth = match parent {
            Some(parent_id) => {
                let parent_loop = self
                    .loops
                    .get(parent_id.0 as usize)
                    .ok_or_else(|| CoreError::UnknownLoop(parent_id.to_string()))?;
                if !blocks.is_subset(&parent_loop.blocks) {
                    return Err(CoreError::MalformedRegion(format!(
                        "{} is not nested inside {}",
                        name, parent_loop.name
                    )));
                }
                parent_loop.depth + 1
            }
            None => 1,
        };

        let id = RegionId(self.loops.len() as u32);
        self.loops.push(LoopRegion {
            id,
            name,
            header,
            blocks,
            latch,
            exit,
            depth,
            start,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent_id) => self.loops[parent_id.0 as usize].children.push(id),
            None => self.top_level.push(id),
        }
        Ok(id)
    }

    pub fn get(&self, id: RegionId) -> &LoopRegion {
        &self.loops[id.0 as usize]
    }

    pub fn find(&self, name: &str) -> Option<RegionId> {
        self.loops.iter().find(|l| l.name == name).map(|l| l.id)
    }

    pub fn top_level(&self) -> &[RegionId] {
        &self.top_level
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }

    /// Outer loops before the loops they contain, siblings in source order.
    pub fn pre_order(&self) -> Vec<RegionId> {
        let mut order = Vec::with_capacity(self.loops.len());
        let mut stack: Vec<RegionId> = self.top_level.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            for &child in self.get(id).children.iter().rev() {
                stack.push(child);
            }
        }
        order
    }
}
