//! Runtime configuration for [`AgroTileApp`](super::AgroTileApp).

use std::net::SocketAddr;
use std::time::Duration;

use crate::config::ConfigFile;
use crate::jobs::PreprocessSettings;
use crate::provider::ProviderCredentials;

/// Everything needed to reach the imagery provider.
#[derive(Clone, Debug)]
pub struct ProviderAppConfig {
    pub base_url: String,
    pub token_url: String,
    pub credentials: ProviderCredentials,
    pub token_timeout: Duration,
    pub fetch_timeout: Duration,
}

/// Top-level configuration passed to `AgroTileApp::start()`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub provider: ProviderAppConfig,
    /// Memory budget of the tile cache.
    pub memory_cache_bytes: u64,
    /// TTL applied to freshly rendered tiles.
    pub tile_ttl_secs: u64,
    pub preprocess: PreprocessSettings,
    pub bind: SocketAddr,
}

impl AppConfig {
    /// Translates the loaded config file into runtime settings.
    pub fn from_config_file(config: &ConfigFile) -> Self {
        let provider = &config.provider;
        Self {
            provider: ProviderAppConfig {
                base_url: provider.base_url.clone(),
                token_url: provider.resolved_token_url(),
                credentials: ProviderCredentials::new(
                    provider.client_id.clone().unwrap_or_default(),
                    provider.client_secret.clone().unwrap_or_default(),
                ),
                token_timeout: Duration::from_secs(provider.token_timeout),
                fetch_timeout: Duration::from_secs(provider.fetch_timeout),
            },
            memory_cache_bytes: config.cache.memory_size as u64,
            tile_ttl_secs: config.cache.tile_ttl,
            preprocess: PreprocessSettings {
                zoom: config.preprocess.zoom,
                max_tiles: config.preprocess.max_tiles,
                warm_concurrency: config.preprocess.concurrency,
                max_concurrent_jobs: config.preprocess.max_concurrent_jobs,
            },
            bind: config.server.bind,
        }
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_tile_ttl_secs(mut self, secs: u64) -> Self {
        self.tile_ttl_secs = secs;
        self
    }

    pub fn with_preprocess(mut self, preprocess: PreprocessSettings) -> Self {
        self.preprocess = preprocess;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_config_file(&ConfigFile::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config_file() {
        let config = AppConfig::default();
        assert_eq!(
            config.provider.token_url,
            "https://services.sentinel-hub.com/oauth/token"
        );
        assert!(config.provider.credentials.is_incomplete());
        assert_eq!(config.provider.fetch_timeout, Duration::from_secs(15));
        assert_eq!(config.memory_cache_bytes, 512 * 1024 * 1024);
        assert_eq!(config.tile_ttl_secs, 21_600);
        assert_eq!(config.preprocess, PreprocessSettings::default());
        assert_eq!(config.bind.port(), 8080);
    }

    #[test]
    fn test_from_custom_config_file() {
        let mut file = ConfigFile::default();
        file.provider.client_id = Some("id".to_string());
        file.provider.client_secret = Some("secret".to_string());
        file.preprocess.zoom = 10;
        file.preprocess.concurrency = 4;

        let config = AppConfig::from_config_file(&file)
            .with_tile_ttl_secs(60)
            .with_bind("0.0.0.0:9999".parse().unwrap());

        assert!(!config.provider.credentials.is_incomplete());
        assert_eq!(config.preprocess.zoom, 10);
        assert_eq!(config.preprocess.warm_concurrency, 4);
        assert_eq!(config.tile_ttl_secs, 60);
        assert_eq!(config.bind.port(), 9999);
    }
}
