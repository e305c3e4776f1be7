//! CLI errors and exit handling.

use std::path::PathBuf;
use std::process;

use agrotile::app::AppError;
use agrotile::config::ConfigFileError;
use agrotile::gateway::TileError;
use agrotile::jobs::JobError;
use agrotile::logging::LoggingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(#[from] LoggingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigFileError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("Failed to fetch tile: {0}")]
    Tile(#[from] TileError),

    #[error("Failed to submit job: {0}")]
    Job(#[from] JobError),

    #[error("Job {job_id} failed: {reason}")]
    JobFailed { job_id: String, reason: String },

    #[error("Failed to write '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to set signal handler: {0}")]
    Signal(String),

    #[error("Failed to start async runtime: {0}")]
    Runtime(std::io::Error),
}

impl CliError {
    /// Prints the error (with hints where useful) and exits with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Tile(TileError::UpstreamAuth { .. }) => {
                eprintln!();
                eprintln!("Check the Sentinel Hub credentials:");
                eprintln!("  [provider] client_id / client_secret in the config file, or");
                eprintln!("  SENTINELHUB_CLIENT_ID / SENTINELHUB_CLIENT_SECRET in the environment");
            }
            CliError::App(AppError::Bind { .. }) => {
                eprintln!();
                eprintln!("Is another process using the address? Try --bind with a different port.");
            }
            _ => {}
        }

        process::exit(1)
    }
}
