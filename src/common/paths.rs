use anyhow::{Context, Result};
use std::path::PathBuf;

/// Centralized path management for gridkey
/// This module provides a single source of truth for all application paths

/// Get the main gridkey config directory
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("gridkey");

    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("creating config directory at {}", config_dir.display()))?;

    Ok(config_dir)
}

/// Get the cache directory. Lives under the config directory rather than
/// XDG cache so a profile directory carries its caches with it. Created
/// lazily by whichever cache writes first, not here.
pub fn cache_dir() -> Result<PathBuf> {
    Ok(config_dir()?.join("caches"))
}

/// Get the icon cache directory
pub fn icon_cache_dir() -> Result<PathBuf> {
    cache_dir()
}

/// Get the installed-apps cache file path
pub fn installed_apps_cache_path() -> Result<PathBuf> {
    Ok(cache_dir()?.join("installed-apps.json"))
}

/// Get the default keyboard profile path
pub fn default_profile_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("keyboard.yaml"))
}
