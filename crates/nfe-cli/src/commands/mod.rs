//! Subcommands.

pub mod config;
pub mod ncm;
pub mod process;

use std::path::PathBuf;

use nfe_core::NfeConfig;

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("nfex")
        .join("config.json")
}

/// Config file in effect: the `--config` value or the default location.
pub fn config_path(config_path: Option<&str>) -> PathBuf {
    config_path.map(PathBuf::from).unwrap_or_else(default_config_path)
}

/// Load the configuration, falling back to defaults when the file is absent.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<(NfeConfig, PathBuf)> {
    let path = self::config_path(config_path);
    let config = NfeConfig::load_or_default(&path)?;
    Ok((config, path))
}

/// Write the configuration, creating its directory if needed.
pub fn save_config(config: &NfeConfig, path: &std::path::Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    config.save(path)?;
    Ok(())
}
