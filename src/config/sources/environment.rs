//! Environment source: STRATUS_STACK, STRATUS_MAX_REACTIVE_PASSES, STRATUS_LOCK__TTL_SECS, ...

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment};

/// Add `STRATUS_*` environment variables; `__` separates nested keys.
pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix("STRATUS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    )
}
