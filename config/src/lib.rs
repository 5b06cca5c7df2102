//! Configuration for Ferry, read from `~/.ferry/config.toml`.
//!
//! Every section and field is optional; accessors resolve defaults so callers never
//! see an `Option` for a setting that has one.

use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use serde::Deserialize;
use thiserror::Error;

use ferry_location::{LocationSettings, DEFAULT_DUPLICATE_WINDOW_MS};
use ferry_net::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_POOL_MAX_IDLE_PER_HOST, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_USER_AGENT, HttpSettings,
};
use ferry_types::{ProviderId, SensorRate};

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_WORKER_THREADS: usize = 2;
pub const DEFAULT_ASSETS_SOURCE: &str = "assets";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FerryConfig {
    pub log: Option<LogConfig>,
    pub network: Option<NetworkConfig>,
    pub location: Option<LocationConfig>,
    pub assets: Option<AssetsConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive. `RUST_LOG` overrides it.
    pub filter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
    pub pool_max_idle_per_host: Option<usize>,
    /// Threads in the runtime that performs requests.
    pub worker_threads: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationConfig {
    pub min_interval_ms: Option<u64>,
    pub min_distance_m: Option<f32>,
    pub fallback_provider: Option<ProviderId>,
    pub orientation_rate: Option<SensorRate>,
    pub duplicate_window_ms: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AssetsConfig {
    pub source_dir: Option<String>,
    /// `~` expands to the home directory.
    pub dest_dir: Option<String>,
}

/// Replace `${VAR}` with the variable's value (empty if unset).
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < value.len() {
        if value[i..].starts_with("${") {
            let start = i + 2;
            if let Some(end_rel) = value[start..].find('}') {
                let end = start + end_rel;
                let var = &value[start..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                i = end + 1;
                continue;
            }
        }

        let Some(ch) = value[i..].chars().next() else {
            break;
        };
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}

/// Expand a leading `~` to the home directory.
fn expand_home(value: &str) -> PathBuf {
    match (value.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest.trim_start_matches(['/', '\\'])),
        _ => PathBuf::from(value),
    }
}

impl FerryConfig {
    /// Load `~/.ferry/config.toml`. `Ok(None)` when it does not exist.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn log_filter(&self) -> String {
        self.log
            .as_ref()
            .and_then(|log| log.filter.as_deref())
            .map_or_else(|| DEFAULT_LOG_FILTER.to_string(), expand_env_vars)
    }

    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        let network = self.network.as_ref();
        HttpSettings {
            connect_timeout: Duration::from_secs(
                network
                    .and_then(|n| n.connect_timeout_secs)
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
            request_timeout: Duration::from_secs(
                network
                    .and_then(|n| n.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            user_agent: network
                .and_then(|n| n.user_agent.as_deref())
                .map_or_else(|| DEFAULT_USER_AGENT.to_string(), expand_env_vars),
            pool_max_idle_per_host: network
                .and_then(|n| n.pool_max_idle_per_host)
                .unwrap_or(DEFAULT_POOL_MAX_IDLE_PER_HOST),
        }
    }

    /// At least one.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        self.network
            .as_ref()
            .and_then(|n| n.worker_threads)
            .unwrap_or(DEFAULT_WORKER_THREADS)
            .max(1)
    }

    #[must_use]
    pub fn location_settings(&self) -> LocationSettings {
        let defaults = LocationSettings::default();
        let Some(location) = self.location.as_ref() else {
            return defaults;
        };
        LocationSettings {
            min_interval_ms: location.min_interval_ms.unwrap_or(defaults.min_interval_ms),
            min_distance_m: location.min_distance_m.unwrap_or(defaults.min_distance_m),
            fallback_provider: location
                .fallback_provider
                .unwrap_or(defaults.fallback_provider),
            orientation_rate: location.orientation_rate.unwrap_or(defaults.orientation_rate),
            duplicate_window_ms: location
                .duplicate_window_ms
                .unwrap_or(DEFAULT_DUPLICATE_WINDOW_MS),
        }
    }

    #[must_use]
    pub fn assets_source(&self) -> PathBuf {
        self.assets
            .as_ref()
            .and_then(|a| a.source_dir.as_deref())
            .map_or_else(
                || PathBuf::from(DEFAULT_ASSETS_SOURCE),
                |dir| expand_home(&expand_env_vars(dir)),
            )
    }

    /// `None` when no home directory can be determined and none is configured.
    #[must_use]
    pub fn assets_dest(&self) -> Option<PathBuf> {
        match self.assets.as_ref().and_then(|a| a.dest_dir.as_deref()) {
            Some(dir) => Some(expand_home(&expand_env_vars(dir))),
            None => data_dir().map(|dir| dir.join("assets")),
        }
    }
}

/// `~/.ferry`, home of the config file, logs and extracted assets.
#[must_use]
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ferry"))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("config.toml"))
}
