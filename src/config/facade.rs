//! Config loading facade

use crate::config::merge::merge_policy;
use crate::config::sources::{environment, global_file, workspace_file};
use crate::config::EngineConfig;
use crate::error::EngineError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`EngineConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the project at `project_root`
    ///
    /// Sources, lowest to highest precedence: defaults, global file, `stratus.toml`,
    /// `config/{STRATUS_ENV}.toml`, `STRATUS_*` environment variables. The result is
    /// validated before it is returned.
    pub fn load(project_root: &Path) -> Result<EngineConfig, EngineError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, project_root)?;
        let builder = environment::add_to_builder(builder);

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(stack = %config.stack, root = %project_root.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from a single file on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<EngineConfig, EngineError> {
        let config: EngineConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()).required(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults only
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> EngineConfig {
        EngineConfig::default()
    }

    pub fn xdg_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }
}
