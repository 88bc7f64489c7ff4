//! Project config file sources: stratus.toml and config/{env}.toml

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::Path;

/// Environment name selecting `config/{env}.toml`
pub fn environment_name() -> String {
    std::env::var("STRATUS_ENV").unwrap_or_else(|_| "development".to_string())
}

/// Add project config files to builder.
/// Precedence: stratus.toml (base) then config/{STRATUS_ENV}.toml (env-specific).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    project_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder;

    let base_config_path = project_root.join("stratus.toml");
    if base_config_path.exists() {
        builder = builder.add_source(File::from(base_config_path).required(false));
    }

    let env_config_path = project_root
        .join("config")
        .join(format!("{}.toml", environment_name()));
    if env_config_path.exists() {
        builder = builder.add_source(File::from(env_config_path).required(false));
    }

    Ok(builder)
}
