//! Default values for every configuration key.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;

use super::settings::*;
use crate::gateway::DEFAULT_TILE_TTL_SECS;
use crate::jobs::{DEFAULT_MAX_PREPROCESS_TILES, DEFAULT_PREPROCESS_ZOOM};
use crate::provider::DEFAULT_BASE_URL;

/// Timeout for the OAuth token exchange, in seconds.
pub const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 10;

/// Timeout for a single render request, in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;

/// In-memory tile cache budget.
pub const DEFAULT_MEMORY_CACHE_SIZE: usize = 512 * 1024 * 1024;

/// Concurrent tile fetches within one job.
pub const DEFAULT_WARM_CONCURRENCY: usize = 1;

/// Jobs allowed to warm at the same time.
pub const DEFAULT_MAX_CONCURRENT_JOBS: usize = 2;

pub const DEFAULT_BIND_PORT: u16 = 8080;

pub const DEFAULT_LOG_DIRECTORY: &str = "logs";

pub const DEFAULT_LOG_FILE: &str = "agrotile.log";

/// Loopback on [`DEFAULT_BIND_PORT`].
pub fn default_bind() -> SocketAddr {
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_BIND_PORT))
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            provider: ProviderSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                token_url: None,
                client_id: None,
                client_secret: None,
                token_timeout: DEFAULT_TOKEN_TIMEOUT_SECS,
                fetch_timeout: DEFAULT_FETCH_TIMEOUT_SECS,
            },
            cache: CacheSettings {
                memory_size: DEFAULT_MEMORY_CACHE_SIZE,
                tile_ttl: DEFAULT_TILE_TTL_SECS,
            },
            preprocess: PreprocessConfig {
                zoom: DEFAULT_PREPROCESS_ZOOM,
                max_tiles: DEFAULT_MAX_PREPROCESS_TILES,
                concurrency: DEFAULT_WARM_CONCURRENCY,
                max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            },
            server: ServerSettings {
                bind: default_bind(),
            },
            logging: LoggingSettings {
                directory: PathBuf::from(DEFAULT_LOG_DIRECTORY),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
