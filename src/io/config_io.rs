use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::EngineConfig;

pub const CONFIG_FILE: &str = "config.toml";

/// Error type for reading the engine configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read `config.toml` from the state directory. A missing file means defaults.
pub fn read_config(state_dir: &Path) -> Result<EngineConfig, ConfigError> {
    let path = state_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(EngineConfig::default()),
        Err(e) => return Err(ConfigError::Read { path, source: e }),
    };
    toml::from_str(&text).map_err(|e| ConfigError::Parse { path, source: e })
}
