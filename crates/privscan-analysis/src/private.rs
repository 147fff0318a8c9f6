use crate::{
    config::AnalysisConfig,
    context::ClassificationContext,
    dependence::DependenceCollector,
    descriptor::DependencySet,
    errors::Result,
    propagate::{force_covered_descendants, propagate_traits},
    resolve::{resolve_accesses, resolve_addresses, resolve_pointers},
    statistics::Statistics,
};
use indexmap::IndexMap;
use privscan_core::{
    AliasTree, AnalysisID, AnalysisPass, DependenceOracle, Function, ModRefOracle, Pass, RegionId,
};
use tracing::{debug, debug_span};

/// Classification of one loop.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopTraits {
    pub set: DependencySet,
    pub statistics: Statistics,
}

/// Results for every loop of a function, outer loops first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrivateInfo {
    loops: IndexMap<RegionId, LoopTraits>,
    statistics: Statistics,
}

impl PrivateInfo {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, region: RegionId, traits: LoopTraits) {
        self.statistics += traits.statistics;
        self.loops.insert(region, traits);
    }

    pub fn get(&self, region: RegionId) -> Option<&DependencySet> {
        self.loops.get(&region).map(|traits| &traits.set)
    }

    pub fn loop_statistics(&self, region: RegionId) -> Option<&Statistics> {
        self.loops.get(&region).map(|traits| &traits.statistics)
    }

    pub fn iter(&self) -> impl Iterator<Item = (RegionId, &DependencySet)> {
        self.loops.iter().map(|(&region, traits)| (region, &traits.set))
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn len(&self) -> usize {
        self.loops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loops.is_empty()
    }
}

/// Classifies the memory of every loop of a function.
#[derive(Debug, Clone, Default)]
pub struct PrivateRecognitionPass {
    config: AnalysisConfig,
}

impl PrivateRecognitionPass {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs with the oracles recorded on the function itself.
    pub fn run(&self, function: &Function) -> Result<PrivateInfo> {
        self.run_with(function, function, function)
    }

    pub fn run_with(
        &self,
        function: &Function,
        dependences: &dyn DependenceOracle,
        mod_ref: &dyn ModRefOracle,
    ) -> Result<PrivateInfo> {
        let mut info = PrivateInfo::new();
        let Some(tree) = &function.alias_tree else {
            debug!(function = %function.name, "no alias tree, nothing to classify");
            return Ok(info);
        };
        for &region in function.regions.top_level() {
            self.resolve_candidates(function, tree, region, dependences, mod_ref, &mut info)?;
        }
        Ok(info)
    }

    fn resolve_candidates(
        &self,
        function: &Function,
        tree: &AliasTree,
        region: RegionId,
        dependences: &dyn DependenceOracle,
        mod_ref: &dyn ModRefOracle,
        info: &mut PrivateInfo,
    ) -> Result<()> {
        let traits = self.classify_loop(function, tree, region, dependences, mod_ref)?;
        info.insert(region, traits);
        for &child in &function.regions.get(region).children {
            self.resolve_candidates(function, tree, child, dependences, mod_ref, info)?;
        }
        Ok(())
    }

    /// Classifies a single loop. Loops are independent of each other: nothing computed for one
    /// loop is reused for another.
    pub fn classify_loop(
        &self,
        function: &Function,
        tree: &AliasTree,
        region: RegionId,
        dependences: &dyn DependenceOracle,
        mod_ref: &dyn ModRefOracle,
    ) -> Result<LoopTraits> {
        let span = debug_span!("classify_loop", function = %function.name, region = %function.regions.get(region).name);
        let _guard = span.enter();

        let mut ctx = ClassificationContext::new(function, tree, region)?;
        ctx.deps = DependenceCollector {
            function,
            tree,
            region: ctx.region,
            dependences,
            mod_ref,
            ignore_loop_independent: self.config.ignore_loop_independent,
        }
        .collect()?;
        debug!(dependences = ctx.deps.len(), "dependences collected");

        resolve_accesses(&mut ctx)?;
        resolve_pointers(&mut ctx)?;
        resolve_addresses(&mut ctx)?;

        let mut set = DependencySet::new();
        propagate_traits(&mut ctx, &mut set);
        force_covered_descendants(&ctx, &mut set);
        debug!(nodes = set.len(), "loop classified");

        let statistics = if self.config.collect_statistics {
            ctx.statistics
        } else {
            Statistics::default()
        };
        Ok(LoopTraits { set, statistics })
    }
}

impl Pass for PrivateRecognitionPass {
    fn name(&self) -> &'static str {
        "private-recognition"
    }

    fn description(&self) -> &'static str {
        "Classifies loop memory as private, shared, read-only or dependent"
    }
}

impl AnalysisPass for PrivateRecognitionPass {
    type Result = PrivateInfo;

    fn analyze(&mut self, function: &Function) -> anyhow::Result<PrivateInfo> {
        Ok(self.run(function)?)
    }

    fn analysis_id(&self) -> AnalysisID {
        AnalysisID::PrivateRecognition
    }
}
