//! Compiler configuration parameters.

use serde::{Deserialize, Serialize};

/// Compiler configuration parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Maximum number of ground rule instances.
    /// Compilation fails with `GroundingLimit` beyond it.
    pub max_ground_rules: usize,

    /// Reorder positive body literals before joining.
    /// Bound literals and small relations are joined first.
    pub order_rules: bool,

    /// Read `strat`/`arg`/`domain_*` directives from the description.
    /// When disabled, directive facts stay in the description as ordinary
    /// facts.
    pub use_hints: bool,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_ground_rules: 1_000_000,
            order_rules: true,
            use_hints: true,
        }
    }
}

impl CompileConfig {
    #[must_use]
    pub fn with_max_ground_rules(mut self, limit: usize) -> Self {
        self.max_ground_rules = limit;
        self
    }

    #[must_use]
    pub fn with_rule_ordering(mut self, enabled: bool) -> Self {
        self.order_rules = enabled;
        self
    }

    #[must_use]
    pub fn with_hints(mut self, enabled: bool) -> Self {
        self.use_hints = enabled;
        self
    }
}
