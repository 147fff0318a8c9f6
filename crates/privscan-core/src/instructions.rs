use crate::block::BlockId;
use crate::values::{MemoryLocation, ValueId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstId(pub u32);

impl std::fmt::Display for InstId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "inst{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Load {
        location: MemoryLocation,
    },
    Store {
        location: MemoryLocation,
        /// Stored value when it is a pointer the model tracks.
        value: Option<ValueId>,
    },
    Call {
        callee: String,
        reads_only: bool,
        /// Locations reachable through the call's pointer operands.
        accesses: Vec<MemoryLocation>,
    },
    /// Memory touched by something other than a load, store or call, such as an atomic
    /// update. Like a call, it has no single location.
    Opaque {
        reads_only: bool,
        accesses: Vec<MemoryLocation>,
    },
    PtrToInt {
        operand: ValueId,
    },
    /// Array or structure addressing rooted at `base`.
    AddressOf {
        base: ValueId,
    },
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: InstId,
    pub block: BlockId,
    pub op: Operation,
}

impl Instruction {
    pub fn new(id: InstId, block: BlockId, op: Operation) -> Self {
        Self { id, block, op }
    }

    pub fn may_read_or_write_memory(&self) -> bool {
        matches!(
            self.op,
            Operation::Load { .. }
                | Operation::Store { .. }
                | Operation::Call { .. }
                | Operation::Opaque { .. }
        )
    }

    pub fn may_write_memory(&self) -> bool {
        match &self.op {
            Operation::Store { .. } => true,
            Operation::Call { reads_only, .. } | Operation::Opaque { reads_only, .. } => {
                !reads_only
            }
            _ => false,
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(self.op, Operation::Call { .. })
    }

    /// The single location this instruction reads or writes, if it can be singled out.
    pub fn load_or_store_location(&self) -> Option<MemoryLocation> {
        match &self.op {
            Operation::Load { location } | Operation::Store { location, .. } => Some(*location),
            _ => None,
        }
    }

    /// Every location this instruction is known to touch.
    pub fn memory_operands(&self) -> Vec<MemoryLocation> {
        match &self.op {
            Operation::Load { location } | Operation::Store { location, .. } => vec![*location],
            Operation::Call { accesses, .. } | Operation::Opaque { accesses, .. } => {
                accesses.clone()
            }
            _ => Vec::new(),
        }
    }

    /// Whether `value` leaves simple dereference here: converted to an integer or stored as data.
    pub fn escapes_address(&self, value: ValueId) -> bool {
        match &self.op {
            Operation::PtrToInt { operand } => *operand == value,
            Operation::Store {
                value: Some(stored),
                ..
            } => *stored == value,
            _ => false,
        }
    }

    pub fn uses(&self, value: ValueId) -> bool {
        match &self.op {
            Operation::Load { location } => location.ptr == value,
            Operation::Store { location, value: stored } => {
                location.ptr == value || *stored == Some(value)
            }
            Operation::Call { accesses, .. } | Operation::Opaque { accesses, .. } => {
                accesses.iter().any(|loc| loc.ptr == value)
            }
            Operation::PtrToInt { operand } => *operand == value,
            Operation::AddressOf { base } => *base == value,
            Operation::Other => false,
        }
    }
}
