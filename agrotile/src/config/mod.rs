//! INI configuration.
//!
//! Settings are read from `~/.agrotile/config.ini` (or an explicit path),
//! layered as: built-in defaults, then the file, then environment
//! variables. A missing file is not an error.
//!
//! ```ini
//! [provider]
//! base_url = https://services.sentinel-hub.com
//! client_id = my-client
//! client_secret = my-secret
//!
//! [cache]
//! memory_size = 512MB
//! tile_ttl = 21600
//!
//! [preprocess]
//! zoom = 12
//! max_tiles = 200
//! ```

mod defaults;
mod env;
mod file;
mod parser;
mod settings;
mod size;

pub use defaults::*;
pub use env::{
    ENV_BASE_URL, ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_MAX_PREPROCESS_TILES, ENV_PREPROCESS_ZOOM,
    ENV_TILE_TTL, ENV_TOKEN_URL,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, LoggingSettings, PreprocessConfig, ProviderSettings,
    ServerSettings,
};
pub use size::{format_size, parse_size, SizeParseError};
