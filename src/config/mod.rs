//! Configuration module for trend-finder
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use crate::error::Result;
use std::path::PathBuf;
use tracing::info;

/// Locate and load settings: explicit env path, well-known paths, then defaults
pub fn load() -> Result<Settings> {
    if let Ok(path) = std::env::var("TREND_FINDER_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    for path in default_paths() {
        if path.exists() {
            info!("Loading settings from: {}", path.display());
            let mut settings = Settings::from_file(&path)?;
            settings.merge_env();
            return Ok(settings);
        }
    }

    info!("No settings file found, using defaults");
    let mut settings = Settings::default();
    settings.merge_env();
    Ok(settings)
}

fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
        PathBuf::from("/etc/trend-finder/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("trend-finder/settings.yml"));
    }
    paths
}
