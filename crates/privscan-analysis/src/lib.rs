/*! Privatization and dependence classification for loops.
 *
 * For every loop of a function and every alias node of its alias tree, the engine decides
 * whether the memory the loop touches is read only, shared, private (with last, second to last
 * or dynamic copy-out and optional copy-in), or carries a loop-carried dependence.
 *
 * ```no_run
 * use privscan_analysis::PrivateRecognitionPass;
 * # fn demo(function: &privscan_core::Function) -> privscan_analysis::Result<()> {
 * let info = PrivateRecognitionPass::new().run(function)?;
 * for (region, set) in info.iter() {
 *     for alias_trait in set.iter() {
 *         println!("{} {}: {}", region, alias_trait.node, alias_trait.descriptor);
 *     }
 * }
 * # Ok(())
 * # }
 * ```
 */

pub mod config;
pub mod context;
pub mod dependence;
pub mod descriptor;
pub mod errors;
pub mod first_private;
pub mod private;
pub mod propagate;
pub mod resolve;
pub mod statistics;
pub mod synthesize;
pub mod traits;

pub use config::AnalysisConfig;
pub use dependence::{
    classify, DependenceFlags, DependenceKinds, DependenceMap, DependenceRecord, KindRecord,
};
pub use descriptor::{
    AliasTrait, DependencyDescriptor, DependencySet, EstimateMemoryTrait, TraitFlags,
    UnknownMemoryTrait,
};
pub use errors::{PrivateError, Result};
pub use private::{LoopTraits, PrivateInfo, PrivateRecognitionPass};
pub use statistics::Statistics;
pub use traits::{Access, PrivateKind, TraitId, TraitSet};
