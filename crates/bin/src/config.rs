//! Gateway settings from disk.
//!
//! The config file is a JSON [`GatewayConfig`]; missing fields keep their
//! defaults. Without `--config`, `<config dir>/lastro/config.json` is read
//! when it exists.

use lastro_data::GatewayConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors reading a config file.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Platform config location:
/// - Linux: `~/.config/lastro/config.json`
/// - macOS: `~/Library/Application Support/lastro/config.json`
/// - Windows: `%APPDATA%\lastro\config.json`
pub(crate) fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lastro")
        .join("config.json")
}

/// Load `explicit`, or the default file if present, or the defaults.
pub(crate) fn load(explicit: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path();
            if !path.exists() {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(GatewayConfig::default());
            }
            path
        }
    };
    let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}
