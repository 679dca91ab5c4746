//! Engine configuration.

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Configuration for the progression service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Derive-and-write attempts before a conflict is surfaced
    pub max_write_attempts: u32,
    /// How long course trees stay cached, in seconds
    pub tree_cache_ttl_secs: u64,
}

impl EngineConfig {
    /// Tree cache TTL as a [`Duration`].
    pub fn tree_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.tree_cache_ttl_secs)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_write_attempts: 2,
            tree_cache_ttl_secs: 300,
        }
    }
}
