//! Per-loop dependence records and the classifier that fills them.
//!
//! Every pair of memory instructions in the loop body is shown to the dependence oracle. Pairs
//! involving an instruction whose footprint cannot be pinned to one location are recorded
//! conservatively without asking it.

use crate::errors::{PrivateError, Result};
use bitflags::bitflags;
use indexmap::IndexMap;
use privscan_core::{
    AliasTree, Dependence, DependenceKind, DependenceOracle, Direction, Distance, Function,
    Instruction, LoopRegion, MemoryLocation, ModRefOracle,
};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::trace;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DependenceKinds: u8 {
        const FLOW = 1 << 0;
        const ANTI = 1 << 1;
        const OUTPUT = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DependenceFlags: u8 {
        /// The dependence may not exist.
        const MAY = 1 << 0;
        /// One side is in the loop header.
        const HEADER_ACCESS = 1 << 1;
        const LOAD_STORE_CAUSE = 1 << 2;
        const CALL_CAUSE = 1 << 3;
        const UNKNOWN_CAUSE = 1 << 4;
        /// At least one occurrence has no known distance; `distances` is then empty.
        const UNKNOWN_DISTANCE = 1 << 5;
    }
}

impl DependenceFlags {
    pub fn keywords(&self) -> Vec<&'static str> {
        [
            (DependenceFlags::MAY, "may"),
            (DependenceFlags::HEADER_ACCESS, "header access"),
            (DependenceFlags::LOAD_STORE_CAUSE, "load/store"),
            (DependenceFlags::CALL_CAUSE, "call"),
            (DependenceFlags::UNKNOWN_CAUSE, "unknown"),
            (DependenceFlags::UNKNOWN_DISTANCE, "unknown distance"),
        ]
        .iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, keyword)| *keyword)
        .collect()
    }
}

/// What the loop knows about one dependence kind on one piece of memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindRecord {
    pub flags: DependenceFlags,
    pub distances: BTreeSet<Distance>,
}

impl KindRecord {
    fn update(&mut self, flags: DependenceFlags, distance: Option<&Distance>) {
        self.flags |= flags;
        match distance {
            Some(distance) if !self.flags.contains(DependenceFlags::UNKNOWN_DISTANCE) => {
                self.distances.insert(distance.clone());
            }
            Some(_) => {}
            None => {
                self.flags |= DependenceFlags::UNKNOWN_DISTANCE;
                self.distances.clear();
            }
        }
    }

    fn merge(&mut self, other: &KindRecord) {
        self.flags |= other.flags;
        if self.flags.contains(DependenceFlags::UNKNOWN_DISTANCE) {
            self.distances.clear();
        } else {
            self.distances.extend(other.distances.iter().cloned());
        }
    }
}

impl Serialize for KindRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("KindRecord", 2)?;
        state.serialize_field("flags", &self.flags.keywords())?;
        let distances: Vec<String> = self.distances.iter().map(|d| d.to_string()).collect();
        state.serialize_field("distances", &distances)?;
        state.end()
    }
}

/// Dependences recorded for one estimate memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependenceRecord {
    kinds: DependenceKinds,
    flow: KindRecord,
    anti: KindRecord,
    output: KindRecord,
}

impl DependenceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> DependenceKinds {
        self.kinds
    }

    pub fn is(&self, kinds: DependenceKinds) -> bool {
        self.kinds.contains(kinds)
    }

    /// Details of a single kind, if it was recorded.
    pub fn kind(&self, kind: DependenceKinds) -> Option<&KindRecord> {
        if !self.kinds.contains(kind) {
            return None;
        }
        if kind == DependenceKinds::FLOW {
            Some(&self.flow)
        } else if kind == DependenceKinds::ANTI {
            Some(&self.anti)
        } else if kind == DependenceKinds::OUTPUT {
            Some(&self.output)
        } else {
            None
        }
    }

    pub fn update(
        &mut self,
        kinds: DependenceKinds,
        flags: DependenceFlags,
        distance: Option<&Distance>,
    ) {
        self.kinds |= kinds;
        if kinds.contains(DependenceKinds::FLOW) {
            self.flow.update(flags, distance);
        }
        if kinds.contains(DependenceKinds::ANTI) {
            self.anti.update(flags, distance);
        }
        if kinds.contains(DependenceKinds::OUTPUT) {
            self.output.update(flags, distance);
        }
    }

    /// Folds in the record of a piece of the same memory.
    pub fn merge(&mut self, other: &DependenceRecord) {
        self.kinds |= other.kinds;
        self.flow.merge(&other.flow);
        self.anti.merge(&other.anti);
        self.output.merge(&other.output);
    }
}

impl Serialize for DependenceRecord {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        for (kind, name) in [
            (DependenceKinds::FLOW, "flow"),
            (DependenceKinds::ANTI, "anti"),
            (DependenceKinds::OUTPUT, "output"),
        ] {
            if let Some(record) = self.kind(kind) {
                map.serialize_entry(name, record)?;
            }
        }
        map.end()
    }
}

pub type DependenceMap = IndexMap<privscan_core::EstimateId, DependenceRecord>;

/// Kinds a tested pair contributes at loop depth `depth`, or `None` when it carries nothing
/// across iterations of that loop.
///
/// The oracle reports the kind in program order of the pair. When the source iteration does
/// not precede the destination iteration the roles swap: a flow dependence observed backwards
/// is an anti dependence and vice versa.
pub fn classify(
    dep: &Dependence,
    depth: usize,
    ignore_loop_independent: bool,
) -> Option<DependenceKinds> {
    let direction = dep.direction(depth);
    if ignore_loop_independent && direction == Direction::Eq {
        return None;
    }
    let kinds = match dep.kind {
        DependenceKind::Input => return None,
        DependenceKind::Output => DependenceKinds::OUTPUT,
        _ if direction == Direction::All => DependenceKinds::FLOW | DependenceKinds::ANTI,
        DependenceKind::Flow if direction.is_forward() => DependenceKinds::FLOW,
        DependenceKind::Flow => DependenceKinds::ANTI,
        DependenceKind::Anti if direction.is_forward() => DependenceKinds::ANTI,
        DependenceKind::Anti => DependenceKinds::FLOW,
    };
    Some(kinds)
}

/// Collects every loop-carried dependence of `region` keyed by the estimate memory it concerns.
pub struct DependenceCollector<'a> {
    pub function: &'a Function,
    pub tree: &'a AliasTree,
    pub region: &'a LoopRegion,
    pub dependences: &'a dyn DependenceOracle,
    pub mod_ref: &'a dyn ModRefOracle,
    pub ignore_loop_independent: bool,
}

impl<'a> DependenceCollector<'a> {
    pub fn collect(&self) -> Result<DependenceMap> {
        let mut deps = DependenceMap::new();
        let body = self.function.loop_instructions(self.region);
        for (index, &src) in body.iter().enumerate() {
            if !src.may_read_or_write_memory() {
                continue;
            }
            match src.load_or_store_location() {
                Some(src_loc) => {
                    for &dst in &body[index..] {
                        if let Some(dst_loc) = dst.load_or_store_location() {
                            self.insert_dependence(&mut deps, src, dst, &src_loc, &dst_loc)?;
                        }
                    }
                }
                None => {
                    for &dst in &body {
                        if dst.may_read_or_write_memory() {
                            self.insert_unknown_dependence(&mut deps, src, dst)?;
                        }
                    }
                }
            }
        }
        Ok(deps)
    }

    fn header_flag(&self, inst: &Instruction) -> DependenceFlags {
        if inst.block == self.region.header {
            DependenceFlags::HEADER_ACCESS
        } else {
            DependenceFlags::empty()
        }
    }

    fn estimate(&self, loc: &MemoryLocation) -> Result<privscan_core::EstimateId> {
        self.tree.find(loc).ok_or_else(|| {
            debug_assert!(false, "no estimate memory for {}", loc);
            PrivateError::MissingEstimate {
                region: self.region.id,
                location: loc.to_string(),
            }
        })
    }

    fn insert_dependence(
        &self,
        deps: &mut DependenceMap,
        src: &Instruction,
        dst: &Instruction,
        src_loc: &MemoryLocation,
        dst_loc: &MemoryLocation,
    ) -> Result<()> {
        let Some(dep) = self.dependences.depends(src.id, dst.id, self.region) else {
            return Ok(());
        };
        let Some(kinds) = classify(&dep, self.region.depth, self.ignore_loop_independent) else {
            trace!(src = %src.id, dst = %dst.id, "dependence ignored");
            return Ok(());
        };
        let flags = DependenceFlags::LOAD_STORE_CAUSE | self.header_flag(src);
        let distance = dep.distance(self.region.depth);
        trace!(src = %src.id, dst = %dst.id, ?kinds, "loop-carried dependence");
        for loc in [src_loc, dst_loc] {
            let em = self.estimate(loc)?;
            deps.entry(em).or_default().update(kinds, flags, distance);
        }
        Ok(())
    }

    fn insert_unknown_dependence(
        &self,
        deps: &mut DependenceMap,
        src: &Instruction,
        dst: &Instruction,
    ) -> Result<()> {
        let cause = if src.is_call() || dst.is_call() {
            DependenceFlags::CALL_CAUSE
        } else {
            DependenceFlags::UNKNOWN_CAUSE
        };
        let flags = cause
            | DependenceFlags::MAY
            | DependenceFlags::UNKNOWN_DISTANCE
            | self.header_flag(src);
        let all = DependenceKinds::all();
        let mut locations = src.memory_operands();
        locations.extend(dst.memory_operands());
        for loc in locations {
            if self.mod_ref.mod_ref(src, &loc).is_no_mod_ref()
                || self.mod_ref.mod_ref(dst, &loc).is_no_mod_ref()
            {
                continue;
            }
            let em = self.estimate(&loc)?;
            deps.entry(em).or_default().update(all, flags, None);
        }
        Ok(())
    }
}
