use serde::{Deserialize, Serialize};

/// Configured quotas on flag configuration resources.
///
/// These are soft quotas: the guard's read-then-compare is not
/// transactionally tied to the subsequent write, so concurrent creates may
/// transiently exceed a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    /// Total non-archived feature flags.
    pub feature_flags: usize,
    /// Strategies per (feature, environment) pair.
    pub feature_environment_strategies: usize,
    /// Constraints per strategy.
    pub constraints: usize,
    /// Values per constraint.
    pub constraint_values: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            feature_flags: 5000,
            feature_environment_strategies: 30,
            constraints: 30,
            constraint_values: 250,
        }
    }
}
