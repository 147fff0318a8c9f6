/*! Read-only model of everything the privatization engine consumes.
 *
 * The classifier never builds alias trees, runs reaching definitions, or solves dependence
 * equations itself. Those results come from upstream collaborators; this crate gives them a
 * concrete shape: arenas of values and instructions, the alias tree, the loop nest, per-loop
 * def-use summaries, reach and live sets, and the dependence and mod/ref oracles.
 */

pub mod alias_tree;
pub mod block;
pub mod dataflow;
pub mod def_use;
pub mod dependence;
pub mod function;
pub mod instructions;
pub mod pass;
pub mod region;
pub mod values;

pub use alias_tree::{
    AliasNode, AliasNodeId, AliasNodeKind, AliasTree, AliasTreeBuilder, EstimateId, EstimateMemory,
};
pub use block::{BlockId, DfNodeId};
pub use dataflow::{DefinitionInfo, LiveSet, LocationSet};
pub use def_use::DefUseSet;
pub use dependence::{
    Dependence, DependenceKind, DependenceOracle, DependenceTable, Direction, Distance, ModRef,
    ModRefOracle,
};
pub use function::Function;
pub use instructions::{InstId, Instruction, Operation};
pub use pass::{AnalysisID, AnalysisPass, Pass, PassManager, PassStatistics};
pub use region::{LoopRegion, RegionId, RegionTree};
pub use values::{MemoryLocation, SourceLocation, Value, ValueId, ValueKind};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown value: {0}")]
    UnknownValue(String),
    #[error("Unknown estimate memory: {0}")]
    UnknownEstimate(String),
    #[error("Unknown alias node: {0}")]
    UnknownAliasNode(String),
    #[error("Unknown loop: {0}")]
    UnknownLoop(String),
    #[error("Malformed alias tree: {0}")]
    MalformedTree(String),
    #[error("Malformed region nest: {0}")]
    MalformedRegion(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
