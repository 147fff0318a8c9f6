#![allow(dead_code)]

use privscan_analysis::{DependencyDescriptor, PrivateInfo, PrivateRecognitionPass};
use privscan_core::{
    AliasNodeId, AliasNodeKind, AliasTreeBuilder, BlockId, DefUseSet, DefinitionInfo, DfNodeId,
    Dependence, DependenceKind, Direction, EstimateId, Function, InstId, LiveSet, LocationSet,
    MemoryLocation, Operation, RegionId, ValueId, ValueKind,
};
use std::collections::BTreeSet;

pub const ENTRY: BlockId = BlockId(0);
pub const HEADER: BlockId = BlockId(1);
pub const BODY: BlockId = BlockId(2);
pub const LATCH: DfNodeId = DfNodeId(0);
pub const EXIT: DfNodeId = DfNodeId(1);

/// One function with a single loop `for.body` over blocks 1 and 2. Collaborator facts are
/// recorded piecemeal and attached by `build`.
pub struct Scenario {
    pub function: Function,
    pub tree: AliasTreeBuilder,
    pub region: RegionId,
    pub def_use: DefUseSet,
    live_out: LocationSet,
    latch_must: LocationSet,
    latch_may: LocationSet,
    exit_must: LocationSet,
    exit_may: LocationSet,
}

impl Scenario {
    pub fn new() -> Self {
        let mut function = Function::new("kernel");
        let blocks: BTreeSet<BlockId> = [HEADER, BODY].into_iter().collect();
        let region = function
            .regions
            .add_loop("for.body", None, HEADER, blocks, LATCH, EXIT, None)
            .unwrap();
        Self {
            function,
            tree: AliasTreeBuilder::new(),
            region,
            def_use: DefUseSet::new(),
            live_out: LocationSet::new(),
            latch_must: LocationSet::new(),
            latch_may: LocationSet::new(),
            exit_must: LocationSet::new(),
            exit_may: LocationSet::new(),
        }
    }

    /// A stack object allocated before the loop, alone in a fresh alias node under the root.
    pub fn object(&mut self, name: &str, size: u64) -> (ValueId, AliasNodeId, EstimateId) {
        let node = self
            .tree
            .add_node(self.tree.top(), AliasNodeKind::Estimate)
            .unwrap();
        let (value, em) = self.object_in(node, name, size);
        (value, node, em)
    }

    pub fn object_in(&mut self, node: AliasNodeId, name: &str, size: u64) -> (ValueId, EstimateId) {
        let value = self
            .function
            .add_value(name, ValueKind::Alloca { block: ENTRY });
        let em = self
            .tree
            .add_estimate(node, vec![value], Some(size), 0, None)
            .unwrap();
        (value, em)
    }

    /// A sub-object of `parent` spanning `size` bytes at `offset`, addressed by a fresh pointer.
    pub fn element(
        &mut self,
        node: AliasNodeId,
        parent: EstimateId,
        name: &str,
        offset: u64,
        size: u64,
    ) -> (ValueId, EstimateId) {
        let value = self.function.add_value(name, ValueKind::Other);
        let em = self
            .tree
            .add_estimate(node, vec![value], Some(size), offset, Some(parent))
            .unwrap();
        (value, em)
    }

    pub fn store(&mut self, loc: MemoryLocation) -> InstId {
        self.def_use.add_explicit_access(loc);
        self.function.add_instruction(
            BODY,
            Operation::Store {
                location: loc,
                value: None,
            },
        )
    }

    pub fn load(&mut self, loc: MemoryLocation) -> InstId {
        self.def_use.add_explicit_access(loc);
        self.function
            .add_instruction(BODY, Operation::Load { location: loc })
    }

    pub fn def(&mut self, loc: MemoryLocation) -> &mut Self {
        self.def_use.add_def(loc);
        self
    }

    pub fn may_def(&mut self, loc: MemoryLocation) -> &mut Self {
        self.def_use.add_may_def(loc);
        self
    }

    pub fn exposed_use(&mut self, loc: MemoryLocation) -> &mut Self {
        self.def_use.add_use(loc);
        self
    }

    pub fn live_out(&mut self, loc: MemoryLocation) -> &mut Self {
        self.live_out.insert(loc);
        self
    }

    pub fn written_before_latch(&mut self, loc: MemoryLocation) -> &mut Self {
        self.latch_must.insert(loc);
        self.latch_may.insert(loc);
        self
    }

    pub fn written_before_exit(&mut self, loc: MemoryLocation) -> &mut Self {
        self.exit_must.insert(loc);
        self.exit_may.insert(loc);
        self
    }

    pub fn maybe_written_before_exit(&mut self, loc: MemoryLocation) -> &mut Self {
        self.exit_may.insert(loc);
        self
    }

    pub fn carried(
        &mut self,
        src: InstId,
        dst: InstId,
        kind: DependenceKind,
        direction: Direction,
    ) -> &mut Self {
        self.function
            .dependences
            .insert_dependence(src, dst, Dependence::new(kind, vec![direction]));
        self
    }

    pub fn build(self) -> Function {
        let mut function = self.function;
        function.alias_tree = Some(self.tree.build());
        function.set_def_use(self.region, self.def_use);
        function.set_live(self.region, LiveSet::new(self.live_out));
        function.set_reach(LATCH, DefinitionInfo::new(self.latch_must, self.latch_may));
        function.set_reach(EXIT, DefinitionInfo::new(self.exit_must, self.exit_may));
        function
    }
}

pub fn classify(function: &Function) -> PrivateInfo {
    PrivateRecognitionPass::new().run(function).unwrap()
}

pub fn node_descriptor(
    info: &PrivateInfo,
    region: RegionId,
    node: AliasNodeId,
) -> DependencyDescriptor {
    info.get(region)
        .and_then(|set| set.get(node))
        .map(|alias_trait| alias_trait.descriptor)
        .unwrap_or_else(|| panic!("no result for {} in {}", node, region))
}
