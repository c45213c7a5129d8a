//! Init and Config commands.

use std::path::Path;

use anyhow::Result;

use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    Settings::init_config_file(config_path, force)?;
    println!("Created configuration file at: {}", config_path.display());
    println!("Edit the [[watchers]] entries, then run 'monokel build'.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(settings: &Settings, config_path: &Path) -> Result<()> {
    let source = if config_path.is_file() {
        config_path.display().to_string()
    } else {
        "defaults (no settings file found)".to_string()
    };
    println!("# Source: {source}");
    println!("{}", settings.to_toml()?);
    Ok(())
}
