use crate::{
    alias_tree::AliasTree,
    block::{BlockId, DfNodeId},
    dataflow::{DefinitionInfo, LiveSet},
    def_use::DefUseSet,
    dependence::{Dependence, DependenceOracle, DependenceTable, ModRef, ModRefOracle},
    instructions::{InstId, Instruction, Operation},
    region::{LoopRegion, RegionId, RegionTree},
    values::{MemoryLocation, Value, ValueId, ValueKind},
};
use std::collections::HashMap;

/// One function together with every collaborator result the classifier reads.
#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    values: Vec<Value>,
    instructions: Vec<Instruction>,
    pub alias_tree: Option<AliasTree>,
    pub regions: RegionTree,
    def_use: HashMap<RegionId, DefUseSet>,
    reach: HashMap<DfNodeId, DefinitionInfo>,
    live: HashMap<RegionId, LiveSet>,
    pub dependences: DependenceTable,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            instructions: Vec::new(),
            alias_tree: None,
            regions: RegionTree::new(),
            def_use: HashMap::new(),
            reach: HashMap::new(),
            live: HashMap::new(),
            dependences: DependenceTable::new(),
        }
    }

    pub fn add_value(&mut self, name: impl Into<String>, kind: ValueKind) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(Value::new(id, name, kind));
        id
    }

    pub fn push_value(&mut self, mut value: Value) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        value.id = id;
        self.values.push(value);
        id
    }

    pub fn value(&self, id: ValueId) -> &Value {
        &self.values[id.0 as usize]
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn find_value(&self, name: &str) -> Option<ValueId> {
        self.values.iter().find(|v| v.name == name).map(|v| v.id)
    }

    pub fn add_instruction(&mut self, block: BlockId, op: Operation) -> InstId {
        let id = InstId(self.instructions.len() as u32);
        self.instructions.push(Instruction::new(id, block, op));
        id
    }

    pub fn instruction(&self, id: InstId) -> &Instruction {
        &self.instructions[id.0 as usize]
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Instructions of the loop body in program order.
    pub fn loop_instructions(&self, region: &LoopRegion) -> Vec<&Instruction> {
        self.instructions
            .iter()
            .filter(|inst| region.contains(inst.block))
            .collect()
    }

    /// Instructions that mention `value` as an operand.
    pub fn users(&self, value: ValueId) -> Vec<&Instruction> {
        self.instructions
            .iter()
            .filter(|inst| inst.uses(value))
            .collect()
    }

    pub fn set_def_use(&mut self, region: RegionId, def_use: DefUseSet) {
        self.def_use.insert(region, def_use);
    }

    pub fn def_use(&self, region: RegionId) -> Option<&DefUseSet> {
        self.def_use.get(&region)
    }

    pub fn def_use_mut(&mut self, region: RegionId) -> &mut DefUseSet {
        self.def_use.entry(region).or_default()
    }

    pub fn set_reach(&mut self, node: DfNodeId, info: DefinitionInfo) {
        self.reach.insert(node, info);
    }

    pub fn reach(&self, node: DfNodeId) -> Option<&DefinitionInfo> {
        self.reach.get(&node)
    }

    pub fn reach_mut(&mut self, node: DfNodeId) -> &mut DefinitionInfo {
        self.reach.entry(node).or_default()
    }

    pub fn set_live(&mut self, region: RegionId, live: LiveSet) {
        self.live.insert(region, live);
    }

    pub fn live(&self, region: RegionId) -> Option<&LiveSet> {
        self.live.get(&region)
    }

    pub fn live_mut(&mut self, region: RegionId) -> &mut LiveSet {
        self.live.entry(region).or_default()
    }

    fn may_alias(&self, a: &MemoryLocation, b: &MemoryLocation) -> bool {
        match &self.alias_tree {
            Some(tree) => tree.may_alias(a, b),
            None => true,
        }
    }
}

impl DependenceOracle for Function {
    fn depends(&self, src: InstId, dst: InstId, region: &LoopRegion) -> Option<Dependence> {
        self.dependences.depends(src, dst, region)
    }
}

impl ModRefOracle for Function {
    /// Recorded answers win; otherwise the instruction's own footprint is checked against the
    /// alias tree.
    fn mod_ref(&self, inst: &Instruction, loc: &MemoryLocation) -> ModRef {
        if let Some(info) = self.dependences.recorded_mod_ref(inst.id, loc) {
            return info;
        }
        match &inst.op {
            Operation::Load { location } => {
                if self.may_alias(location, loc) {
                    ModRef::Ref
                } else {
                    ModRef::NoModRef
                }
            }
            Operation::Store { location, .. } => {
                if self.may_alias(location, loc) {
                    ModRef::Mod
                } else {
                    ModRef::NoModRef
                }
            }
            Operation::Call {
                reads_only,
                accesses,
                ..
            }
            | Operation::Opaque {
                reads_only,
                accesses,
            } => {
                let touches =
                    accesses.is_empty() || accesses.iter().any(|a| self.may_alias(a, loc));
                match (touches, reads_only) {
                    (false, _) => ModRef::NoModRef,
                    (true, true) => ModRef::Ref,
                    (true, false) => ModRef::ModRef,
                }
            }
            _ => ModRef::NoModRef,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias_tree::{AliasNodeKind, AliasTreeBuilder};

    #[test]
    fn test_mod_ref_falls_back_to_alias_tree() {
        let mut function = Function::new("f");
        let x = function.add_value("x", ValueKind::Alloca { block: BlockId(0) });
        let y = function.add_value("y", ValueKind::Alloca { block: BlockId(0) });
        let x_loc = MemoryLocation::sized(x, 4);
        let y_loc = MemoryLocation::sized(y, 4);

        let mut builder = AliasTreeBuilder::new();
        let nx = builder
            .add_node(builder.top(), AliasNodeKind::Estimate)
            .unwrap();
        let ny = builder
            .add_node(builder.top(), AliasNodeKind::Estimate)
            .unwrap();
        builder.add_estimate(nx, vec![x], Some(4), 0, None).unwrap();
        builder.add_estimate(ny, vec![y], Some(4), 0, None).unwrap();
        function.alias_tree = Some(builder.build());

        let store = function.add_instruction(
            BlockId(1),
            Operation::Store {
                location: x_loc,
                value: None,
            },
        );
        let call = function.add_instruction(
            BlockId(1),
            Operation::Call {
                callee: "opaque".to_string(),
                reads_only: false,
                accesses: Vec::new(),
            },
        );

        assert_eq!(function.mod_ref(function.instruction(store), &x_loc), ModRef::Mod);
        assert_eq!(
            function.mod_ref(function.instruction(store), &y_loc),
            ModRef::NoModRef
        );
        assert_eq!(
            function.mod_ref(function.instruction(call), &y_loc),
            ModRef::ModRef
        );

        function
            .dependences
            .insert_mod_ref(call, y_loc, ModRef::NoModRef);
        assert_eq!(
            function.mod_ref(function.instruction(call), &y_loc),
            ModRef::NoModRef
        );
    }
}
