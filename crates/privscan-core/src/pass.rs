use crate::function::Function;
use anyhow::Result;
use std::any::Any;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisID {
    PrivateRecognition,
    Custom(&'static str),
}

pub trait Pass {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }
}

pub trait AnalysisPass: Pass {
    type Result: Any;

    fn analyze(&mut self, function: &Function) -> Result<Self::Result>;

    fn analysis_id(&self) -> AnalysisID;
}

#[derive(Debug, Clone)]
pub struct PassStatistics {
    pub name: String,
    pub function: String,
    pub duration: Duration,
}

/// Runs analyses on functions and caches their results by function name. Each function's entry
/// is independent of every other, so results for one function never depend on another.
pub struct PassManager {
    analysis_cache: HashMap<(AnalysisID, String), Box<dyn Any>>,
    statistics: Vec<PassStatistics>,
    collect_stats: bool,
}

impl PassManager {
    pub fn new() -> Self {
        Self {
            analysis_cache: HashMap::new(),
            statistics: Vec::new(),
            collect_stats: false,
        }
    }

    pub fn enable_statistics(&mut self) {
        self.collect_stats = true;
    }

    pub fn run<A: AnalysisPass>(&mut self, pass: &mut A, function: &Function) -> Result<&A::Result> {
        let key = (pass.analysis_id(), function.name.clone());

        if !self.analysis_cache.contains_key(&key) {
            let start = if self.collect_stats {
                Some(Instant::now())
            } else {
                None
            };

            let result = pass.analyze(function)?;

            if let Some(start) = start {
                self.statistics.push(PassStatistics {
                    name: pass.name().to_string(),
                    function: function.name.clone(),
                    duration: start.elapsed(),
                });
            }
            self.analysis_cache.insert(key.clone(), Box::new(result));
        }

        self.analysis_cache
            .get(&key)
            .and_then(|boxed| boxed.downcast_ref::<A::Result>())
            .ok_or_else(|| anyhow::anyhow!("Failed to get analysis result"))
    }

    pub fn get<A: AnalysisPass>(&self, analysis_id: AnalysisID, function_name: &str) -> Option<&A::Result> {
        self.analysis_cache
            .get(&(analysis_id, function_name.to_string()))
            .and_then(|boxed| boxed.downcast_ref::<A::Result>())
    }

    pub fn is_analysis_valid(&self, function_name: &str, analysis_id: AnalysisID) -> bool {
        self.analysis_cache
            .contains_key(&(analysis_id, function_name.to_string()))
    }

    pub fn invalidate(&mut self, function_name: &str) {
        self.analysis_cache.retain(|(_, name), _| name != function_name);
    }

    pub fn statistics(&self) -> &[PassStatistics] {
        &self.statistics
    }

    pub fn clear_cache(&mut self) {
        self.analysis_cache.clear();
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingPass {
        runs: usize,
    }

    impl Pass for CountingPass {
        fn name(&self) -> &'static str {
            "counting"
        }
    }

    impl AnalysisPass for CountingPass {
        type Result = usize;

        fn analyze(&mut self, function: &Function) -> Result<usize> {
            self.runs += 1;
            Ok(function.instructions().len())
        }

        fn analysis_id(&self) -> AnalysisID {
            AnalysisID::Custom("counting")
        }
    }

    #[test]
    fn test_analysis_caching() {
        let mut manager = PassManager::new();
        manager.enable_statistics();
        let mut pass = CountingPass { runs: 0 };
        let function = Function::new("f");

        assert_eq!(*manager.run(&mut pass, &function).unwrap(), 0);
        assert_eq!(*manager.run(&mut pass, &function).unwrap(), 0);
        assert_eq!(pass.runs, 1);
        assert_eq!(manager.statistics().len(), 1);
        assert!(manager.is_analysis_valid("f", AnalysisID::Custom("counting")));

        manager.invalidate("f");
        assert!(!manager.is_analysis_valid("f", AnalysisID::Custom("counting")));
        manager.run(&mut pass, &function).unwrap();
        assert_eq!(pass.runs, 2);
    }
}
