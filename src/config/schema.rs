use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PATTERN_TIMEOUT_MS: u64 = 100;
pub const DEFAULT_MAX_CONDITION_DEPTH: usize = 32;
pub const DEFAULT_SUGGESTION_THRESHOLD: usize = 3;

/// tunables for the rule engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// wall-clock limit for a single regex match, in milliseconds
    #[serde(default = "default_pattern_timeout_ms")]
    pub pattern_timeout_ms: u64,
    /// deepest allowed nesting of condition groups
    #[serde(default = "default_max_condition_depth")]
    pub max_condition_depth: usize,
    /// max edit distance for "did you mean" hints in rule validation
    #[serde(default = "default_suggestion_threshold")]
    pub suggestion_threshold: usize,
}

fn default_pattern_timeout_ms() -> u64 {
    DEFAULT_PATTERN_TIMEOUT_MS
}

fn default_max_condition_depth() -> usize {
    DEFAULT_MAX_CONDITION_DEPTH
}

fn default_suggestion_threshold() -> usize {
    DEFAULT_SUGGESTION_THRESHOLD
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pattern_timeout_ms: default_pattern_timeout_ms(),
            max_condition_depth: default_max_condition_depth(),
            suggestion_threshold: default_suggestion_threshold(),
        }
    }
}

impl EngineConfig {
    pub fn pattern_timeout(&self) -> Duration {
        Duration::from_millis(self.pattern_timeout_ms)
    }
}
