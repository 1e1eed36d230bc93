//! Command implementations for modkit-cli

pub mod config;
pub mod inspect;
pub mod lifecycle;

use std::path::Path;

use modkit_core::{HostConfig, Orchestrator};

use crate::error::{CliError, Result};

pub use config::run_config;
pub use inspect::{run_bundles, run_list, run_plan, run_readme};
pub use lifecycle::{run_activate, run_deactivate, run_install, run_remove, run_sync_theme};

/// Load the host configuration and build an orchestrator from it.
pub fn open(config_path: &Path) -> Result<Orchestrator> {
    if !config_path.exists() {
        return Err(CliError::user(format!(
            "Host configuration not found: {} (use --config)",
            config_path.display()
        )));
    }
    let config = HostConfig::load(config_path)?;
    Ok(Orchestrator::from_config(config)?)
}
