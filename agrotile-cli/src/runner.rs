//! Shared command setup: config loading, logging and the app instance.

use std::path::Path;

use agrotile::app::{AgroTileApp, AppConfig};
use agrotile::config::{config_file_path, ConfigFile};
use agrotile::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Loads the configuration for the `--config` path, or the default path.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_with_env(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Keeps logging alive for the duration of a command.
pub struct CliRunner {
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    pub fn new(config_path: Option<&Path>) -> Result<Self, CliError> {
        let config = load_config(config_path)?;
        let logging_guard = init_logging(&config.logging.directory, &config.logging.file)?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str, config_path: Option<&Path>) {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);
        info!(
            version = agrotile::VERSION,
            command = command,
            config = %config_path.display(),
            "AgroTile starting"
        );
    }

    /// Assembles the service from the loaded configuration.
    pub fn start_app(&self, config: AppConfig) -> Result<AgroTileApp, CliError> {
        Ok(AgroTileApp::start(config)?)
    }
}
