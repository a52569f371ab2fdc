//! Command implementations.

mod info;
mod sample;
mod validate;
mod write;

pub use info::run_info;
pub use sample::run_sample_config;
pub use validate::run_validate;
pub use write::run_write;

use std::path::Path;

use anyhow::{Context, Result};
use contracts::RelayBlueprint;

use crate::error::CliError;

/// Load and validate a configuration file
fn load_config(path: &Path) -> Result<RelayBlueprint> {
    if !path.exists() {
        return Err(CliError::config_not_found(path.display().to_string()).into());
    }

    config_loader::ConfigLoader::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}
