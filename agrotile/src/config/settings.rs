//! Typed configuration sections.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::provider::TOKEN_PATH;

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub cache: CacheSettings,
    pub preprocess: PreprocessConfig,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// `[provider]`
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Explicit token endpoint; derived from `base_url` when unset.
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Seconds.
    pub token_timeout: u64,
    /// Seconds.
    pub fetch_timeout: u64,
}

impl ProviderSettings {
    /// The token endpoint, defaulting to `{base_url}/oauth/token`.
    pub fn resolved_token_url(&self) -> String {
        match &self.token_url {
            Some(url) => url.clone(),
            None => format!("{}{}", self.base_url.trim_end_matches('/'), TOKEN_PATH),
        }
    }
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Bytes.
    pub memory_size: usize,
    /// Seconds a rendered tile stays cached.
    pub tile_ttl: u64,
}

/// `[preprocess]`
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    pub zoom: u8,
    pub max_tiles: usize,
    pub concurrency: usize,
    pub max_concurrent_jobs: usize,
}

/// `[server]`
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}
