//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::geo::FixOptions;
use crate::repository::RepositoryConfig;
use crate::store::StoreConfig;

/// Error from a malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Pre-populated SQLite schedule database.
    pub database: PathBuf,
    /// Directory for the persistent reference-data cache.
    pub cache_dir: PathBuf,
    /// Reference-data version; cache entries from other versions are ignored.
    pub data_version: String,
    pub bind: SocketAddr,
    pub geolocation_timeout: Duration,
    /// Zero disables the departure cache.
    pub departure_cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("MTS.db"),
            cache_dir: PathBuf::from(".metro-cache"),
            data_version: "1".to_string(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            geolocation_timeout: Duration::from_millis(5000),
            departure_cache_ttl: Duration::from_secs(60),
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("METRO_DATABASE") {
            config.database = PathBuf::from(path);
        }
        if let Some(dir) = lookup("METRO_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(version) = lookup("METRO_DATA_VERSION") {
            if version.trim().is_empty() {
                return Err(ConfigError {
                    key: "METRO_DATA_VERSION",
                    value: version,
                    reason: "must not be empty".to_string(),
                });
            }
            config.data_version = version;
        }
        if let Some(bind) = parse(&lookup, "METRO_BIND")? {
            config.bind = bind;
        }
        if let Some(ms) = parse::<u64>(&lookup, "METRO_GEOLOCATION_TIMEOUT_MS")? {
            config.geolocation_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = parse::<u64>(&lookup, "METRO_DEPARTURE_CACHE_TTL_SECS")? {
            config.departure_cache_ttl = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(&self.database)
    }

    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig::default().with_cache_ttl(self.departure_cache_ttl)
    }

    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            timeout: self.geolocation_timeout,
            ..FixOptions::default()
        }
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError {
                key,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}
