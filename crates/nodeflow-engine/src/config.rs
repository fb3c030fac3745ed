//! Executor configuration

use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Tunables for [`Executor`](crate::executor::Executor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    /// Maximum number of node tasks running at once (minimum 1)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    defaults::MAX_CONCURRENCY
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: defaults::MAX_CONCURRENCY,
        }
    }
}

impl ExecutorConfig {
    /// Set the concurrency limit
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Concurrency limit clamped to at least one task
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }
}
