//! Merge rules: defaults, override order, conflict handling.

use crate::config::{default_lock_ttl_secs, default_max_reactive_passes, default_stack};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
///
/// Later sources override earlier ones key by key; tables are merged, not replaced.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("stack", default_stack())?
        .set_default("max_reactive_passes", default_max_reactive_passes() as u64)?
        .set_default("malformed_descriptors", "drop")?
        .set_default("lock.enabled", true)?
        .set_default("lock.ttl_secs", default_lock_ttl_secs())
}
