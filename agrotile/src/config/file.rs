//! Loading `~/.agrotile/config.ini`.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;
use super::size::format_size;

const CONFIG_DIR_NAME: &str = ".agrotile";
const CONFIG_FILE_NAME: &str = "config.ini";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigFile {
    /// Loads the default config file, then environment overrides.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_with_env(&config_file_path())
    }

    /// Loads `path`, then environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigFileError> {
        let mut config = Self::load_from(path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Loads `path` alone. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Effective settings as `(key, value)` rows, secrets masked.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        fn masked(value: &Option<String>) -> String {
            match value {
                Some(_) => "********".to_string(),
                None => "(unset)".to_string(),
            }
        }

        vec![
            ("provider.base_url", self.provider.base_url.clone()),
            ("provider.token_url", self.provider.resolved_token_url()),
            (
                "provider.client_id",
                self.provider
                    .client_id
                    .clone()
                    .unwrap_or_else(|| "(unset)".to_string()),
            ),
            ("provider.client_secret", masked(&self.provider.client_secret)),
            ("provider.token_timeout", format!("{}s", self.provider.token_timeout)),
            ("provider.fetch_timeout", format!("{}s", self.provider.fetch_timeout)),
            ("cache.memory_size", format_size(self.cache.memory_size)),
            ("cache.tile_ttl", format!("{}s", self.cache.tile_ttl)),
            ("preprocess.zoom", self.preprocess.zoom.to_string()),
            ("preprocess.max_tiles", self.preprocess.max_tiles.to_string()),
            ("preprocess.concurrency", self.preprocess.concurrency.to_string()),
            (
                "preprocess.max_concurrent_jobs",
                self.preprocess.max_concurrent_jobs.to_string(),
            ),
            ("server.bind", self.server.bind.to_string()),
            ("logging.directory", self.logging.directory.display().to_string()),
            ("logging.file", self.logging.file.clone()),
        ]
    }
}

/// `~/.agrotile`, or `./.agrotile` when no home directory is known.
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// `~/.agrotile/config.ini`
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
