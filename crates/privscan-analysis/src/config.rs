use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Drop dependences the oracle reports as loop-independent at the loop's own depth.
    pub ignore_loop_independent: bool,
    pub collect_statistics: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            ignore_loop_independent: true,
            collect_statistics: true,
        }
    }
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keep_loop_independent(mut self) -> Self {
        self.ignore_loop_independent = false;
        self
    }

    pub fn without_statistics(mut self) -> Self {
        self.collect_statistics = false;
        self
    }
}
