//! Engine Configuration

use serde::{Deserialize, Serialize};
use std::path::Path;
use threshold::BelowRangePolicy;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How to classify values under the lowest threshold band
    pub below_range_policy: BelowRangePolicy,

    /// Decimal places for presentation (logs, summaries); storage
    /// always keeps full precision
    pub display_decimals: u32,

    /// Number of mutexes in the per-reading lock pool
    pub lock_stripes: usize,

    /// Capacity of the worker event channel
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            below_range_policy: BelowRangePolicy::Unclassified,
            display_decimals: 2,
            lock_stripes: 64,
            queue_capacity: 256,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file, with `FLOODWATCH_`-prefixed
    /// environment variables layered on top. Missing keys fall back
    /// to the defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("FLOODWATCH")
                    .try_parsing(true),
            )
            .build()?;
        settings.try_deserialize()
    }
}
