//! Engine-wide constants
//!
//! Single source of truth for executor defaults.

/// Default values for executor configuration
pub mod defaults {
    /// Maximum number of node tasks running at once
    pub const MAX_CONCURRENCY: usize = 8;
    /// Prefix of generated execution ids
    pub const EXECUTION_ID_PREFIX: &str = "run";
}
