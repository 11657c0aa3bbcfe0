//! Configuration parsing, overrides and validation.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use parser::{load_config, write_backup, LoadedConfig};
pub use types::*;

use std::path::Path;

use crate::common::error::ConfigError;

/// Load a config file, apply environment overrides and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<LoadedConfig, ConfigError> {
    let LoadedConfig { config, raw } = load_config(path)?;
    let config = env::apply_env_overrides(config);
    validate::validate_config(&config)?;
    Ok(LoadedConfig { config, raw })
}
