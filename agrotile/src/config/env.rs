//! Environment variable overrides.
//!
//! Deployment environments configure the service through these variables;
//! they win over the config file.

use super::file::ConfigFileError;
use super::settings::ConfigFile;

pub const ENV_BASE_URL: &str = "SENTINELHUB_BASE_URL";
pub const ENV_TOKEN_URL: &str = "SENTINELHUB_TOKEN_URL";
pub const ENV_CLIENT_ID: &str = "SENTINELHUB_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SENTINELHUB_CLIENT_SECRET";
pub const ENV_TILE_TTL: &str = "SATELLITE_TILE_TTL_SECONDS";
pub const ENV_PREPROCESS_ZOOM: &str = "SATELLITE_PREPROCESS_ZOOM";
pub const ENV_MAX_PREPROCESS_TILES: &str = "SATELLITE_MAX_PREPROCESS_TILES";

/// Variable name → (section, key).
const OVERRIDES: [(&str, &str, &str); 7] = [
    (ENV_BASE_URL, "provider", "base_url"),
    (ENV_TOKEN_URL, "provider", "token_url"),
    (ENV_CLIENT_ID, "provider", "client_id"),
    (ENV_CLIENT_SECRET, "provider", "client_secret"),
    (ENV_TILE_TTL, "cache", "tile_ttl"),
    (ENV_PREPROCESS_ZOOM, "preprocess", "zoom"),
    (ENV_MAX_PREPROCESS_TILES, "preprocess", "max_tiles"),
];

impl ConfigFile {
    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigFileError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides resolved through `lookup`.
    ///
    /// Unset and blank variables leave the current value alone.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (name, section, key) in OVERRIDES {
            let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            self.set_value(section, key, &value)
                .map_err(|e| match e {
                    ConfigFileError::InvalidValue { value, reason, .. } => {
                        ConfigFileError::InvalidValue {
                            section: "env".to_string(),
                            key: name.to_string(),
                            value,
                            reason,
                        }
                    }
                    other => other,
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_overrides_apply() {
        let mut config = ConfigFile::default();
        config
            .apply_overrides(lookup(&[
                (ENV_CLIENT_ID, "env-client"),
                (ENV_CLIENT_SECRET, "env-secret"),
                (ENV_TILE_TTL, "120"),
                (ENV_PREPROCESS_ZOOM, "10"),
                (ENV_MAX_PREPROCESS_TILES, "25"),
                (ENV_TOKEN_URL, "https://auth.example.com/token"),
            ]))
            .unwrap();

        assert_eq!(config.provider.client_id.as_deref(), Some("env-client"));
        assert_eq!(config.provider.client_secret.as_deref(), Some("env-secret"));
        assert_eq!(config.cache.tile_ttl, 120);
        assert_eq!(config.preprocess.zoom, 10);
        assert_eq!(config.preprocess.max_tiles, 25);
        assert_eq!(
            config.provider.resolved_token_url(),
            "https://auth.example.com/token"
        );
    }

    #[test]
    fn test_blank_variables_are_ignored() {
        let mut config = ConfigFile::default();
        config
            .apply_overrides(lookup(&[(ENV_TILE_TTL, "  ")]))
            .unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_invalid_override_names_the_variable() {
        let mut config = ConfigFile::default();
        let err = config
            .apply_overrides(lookup(&[(ENV_PREPROCESS_ZOOM, "40")]))
            .unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "env");
                assert_eq!(key, ENV_PREPROCESS_ZOOM);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
