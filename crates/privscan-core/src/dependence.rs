use crate::{
    instructions::{InstId, Instruction},
    region::LoopRegion,
    values::MemoryLocation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependenceKind {
    /// Write then read.
    Flow,
    /// Read then write.
    Anti,
    /// Write then write.
    Output,
    /// Read then read.
    Input,
}

/// Direction vector entry at one loop level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Lt,
    Eq,
    Le,
    Gt,
    Ne,
    Ge,
    All,
}

impl Direction {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lt" | "<" => Some(Self::Lt),
            "eq" | "=" => Some(Self::Eq),
            "le" | "<=" => Some(Self::Le),
            "gt" | ">" => Some(Self::Gt),
            "ne" | "<>" => Some(Self::Ne),
            "ge" | ">=" => Some(Self::Ge),
            "all" | "*" => Some(Self::All),
            _ => None,
        }
    }

    /// Source iteration precedes (or may equal) the destination iteration.
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Lt | Self::Le)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Distance {
    Constant(i64),
    Symbolic(String),
}

impl std::fmt::Display for Distance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Distance::Constant(value) => write!(f, "{}", value),
            Distance::Symbolic(expr) => write!(f, "{}", expr),
        }
    }
}

/// Raw result of a pairwise dependence test. Both vectors are indexed by loop depth minus one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependence {
    pub kind: DependenceKind,
    pub directions: Vec<Direction>,
    pub distances: Vec<Option<Distance>>,
}

impl Dependence {
    pub fn new(kind: DependenceKind, directions: Vec<Direction>) -> Self {
        Self {
            kind,
            directions,
            distances: Vec::new(),
        }
    }

    pub fn with_distances(mut self, distances: Vec<Option<Distance>>) -> Self {
        self.distances = distances;
        self
    }

    /// Direction at `depth`; levels the test did not report are unconstrained.
    pub fn direction(&self, depth: usize) -> Direction {
        depth
            .checked_sub(1)
            .and_then(|level| self.directions.get(level))
            .copied()
            .unwrap_or(Direction::All)
    }

    pub fn distance(&self, depth: usize) -> Option<&Distance> {
        depth
            .checked_sub(1)
            .and_then(|level| self.distances.get(level))
            .and_then(|d| d.as_ref())
    }
}

pub trait DependenceOracle {
    fn depends(&self, src: InstId, dst: InstId, region: &LoopRegion) -> Option<Dependence>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModRef {
    NoModRef,
    Ref,
    Mod,
    ModRef,
}

impl ModRef {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" | "nomodref" => Some(Self::NoModRef),
            "ref" => Some(Self::Ref),
            "mod" => Some(Self::Mod),
            "modref" => Some(Self::ModRef),
            _ => None,
        }
    }

    pub fn is_no_mod_ref(&self) -> bool {
        matches!(self, Self::NoModRef)
    }
}

pub trait ModRefOracle {
    fn mod_ref(&self, inst: &Instruction, loc: &MemoryLocation) -> ModRef;
}

/// Precomputed oracle answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependenceTable {
    dependences: HashMap<(InstId, InstId), Dependence>,
    mod_refs: HashMap<(InstId, MemoryLocation), ModRef>,
}

impl DependenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_dependence(&mut self, src: InstId, dst: InstId, dep: Dependence) {
        self.dependences.insert((src, dst), dep);
    }

    pub fn insert_mod_ref(&mut self, inst: InstId, loc: MemoryLocation, info: ModRef) {
        self.mod_refs.insert((inst, loc), info);
    }

    pub fn dependence(&self, src: InstId, dst: InstId) -> Option<&Dependence> {
        self.dependences.get(&(src, dst))
    }

    pub fn recorded_mod_ref(&self, inst: InstId, loc: &MemoryLocation) -> Option<ModRef> {
        self.mod_refs.get(&(inst, *loc)).copied()
    }

    pub fn len(&self) -> usize {
        self.dependences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependences.is_empty()
    }
}

impl DependenceOracle for DependenceTable {
    fn depends(&self, src: InstId, dst: InstId, _region: &LoopRegion) -> Option<Dependence> {
        self.dependence(src, dst).cloned()
    }
}
