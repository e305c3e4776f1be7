//! INI parsing and per-key validation.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use ini::Ini;
use tracing::{debug, warn};

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::coord::MAX_ZOOM;
use crate::jobs::MAX_WARM_CONCURRENCY;

/// Overlays every recognised key in `ini` onto the defaults.
///
/// Unknown sections and keys are ignored.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    for (section, properties) in ini.iter() {
        let Some(section) = section else { continue };
        for (key, value) in properties.iter() {
            if !config.set_value(section, key, value)? {
                debug!(section = section, key = key, "Ignoring unknown config key");
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: impl Into<String>) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T, ConfigFileError> {
    value
        .parse()
        .map_err(|_| invalid(section, key, value, "must be a non-negative integer"))
}

fn parse_positive(section: &str, key: &str, value: &str) -> Result<u64, ConfigFileError> {
    match parse_number::<u64>(section, key, value)? {
        0 => Err(invalid(section, key, value, "must be at least 1")),
        n => Ok(n),
    }
}

fn parse_url(section: &str, key: &str, value: &str) -> Result<String, ConfigFileError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value.trim_end_matches('/').to_string())
    } else {
        Err(invalid(section, key, value, "must start with http:// or https://"))
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

impl ConfigFile {
    /// Validates and applies one `section.key = value` setting.
    ///
    /// Returns `Ok(false)` for keys this version does not know.
    pub fn set_value(
        &mut self,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<bool, ConfigFileError> {
        let value = value.trim();

        match (section, key) {
            ("provider", "base_url") => {
                self.provider.base_url = parse_url(section, key, value)?;
            }
            ("provider", "token_url") => {
                self.provider.token_url = match value {
                    "" => None,
                    v => Some(parse_url(section, key, v)?),
                };
            }
            ("provider", "client_id") => self.provider.client_id = non_empty(value),
            ("provider", "client_secret") => self.provider.client_secret = non_empty(value),
            ("provider", "token_timeout") => {
                self.provider.token_timeout = parse_positive(section, key, value)?;
            }
            ("provider", "fetch_timeout") => {
                self.provider.fetch_timeout = parse_positive(section, key, value)?;
            }

            ("cache", "memory_size") => {
                self.cache.memory_size = match parse_size(value) {
                    Ok(0) => return Err(invalid(section, key, value, "must be greater than zero")),
                    Ok(bytes) => bytes,
                    Err(e) => return Err(invalid(section, key, value, e.to_string())),
                };
            }
            ("cache", "tile_ttl") => {
                self.cache.tile_ttl = parse_positive(section, key, value)?;
            }

            ("preprocess", "zoom") => {
                let zoom: u8 = parse_number(section, key, value)?;
                if zoom > MAX_ZOOM {
                    return Err(invalid(
                        section,
                        key,
                        value,
                        format!("must be between 0 and {}", MAX_ZOOM),
                    ));
                }
                self.preprocess.zoom = zoom;
            }
            ("preprocess", "max_tiles") => {
                self.preprocess.max_tiles = parse_positive(section, key, value)? as usize;
            }
            ("preprocess", "concurrency") => {
                let requested: usize = parse_number(section, key, value)?;
                let clamped = requested.clamp(1, MAX_WARM_CONCURRENCY);
                if clamped != requested {
                    warn!(
                        requested = requested,
                        clamped = clamped,
                        "preprocess.concurrency out of range, clamping"
                    );
                }
                self.preprocess.concurrency = clamped;
            }
            ("preprocess", "max_concurrent_jobs") => {
                self.preprocess.max_concurrent_jobs = parse_positive(section, key, value)? as usize;
            }

            ("server", "bind") => {
                self.server.bind = value.parse::<SocketAddr>().map_err(|_| {
                    invalid(section, key, value, "must be an address like 127.0.0.1:8080")
                })?;
            }

            ("logging", "directory") => {
                if value.is_empty() {
                    return Err(invalid(section, key, value, "must not be empty"));
                }
                self.logging.directory = expand_home(value);
            }
            ("logging", "file") => {
                if value.is_empty() {
                    return Err(invalid(section, key, value, "must not be empty"));
                }
                self.logging.file = value.to_string();
            }

            _ => return Ok(false),
        }

        Ok(true)
    }
}
