/*! Unified interface for loop privatization analysis.
 *
 * Single import for loading collaborator facts, classifying every loop of a function, and
 * printing the result.
 */

pub use privscan_analysis as analysis;
pub use privscan_core as core;
pub use privscan_emit as emit;
pub use privscan_parser as parser;

pub use privscan_core::{AliasTree, Function, LoopRegion, MemoryLocation, RegionTree};

pub use privscan_analysis::{
    AnalysisConfig, DependencyDescriptor, DependencySet, PrivateInfo, PrivateRecognitionPass,
    Statistics, TraitFlags,
};

pub use privscan_emit::{DumpConfig, TraitDumper};

pub use privscan_parser::parse_file;

/// Loads every function in `input` and classifies it with the default configuration.
pub fn analyze(input: &str) -> anyhow::Result<Vec<(Function, PrivateInfo)>> {
    let pass = PrivateRecognitionPass::new();
    privscan_parser::load(input)?
        .into_iter()
        .map(|function| {
            let info = pass.run(&function)?;
            Ok((function, info))
        })
        .collect()
}
