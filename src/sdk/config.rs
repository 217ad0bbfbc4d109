use std::{env, fmt, str::FromStr};
use thiserror::Error;

use super::map::basemap::{DEFAULT_TILE_URL, DEFAULT_USER_AGENT};
use super::map::{DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
use super::routing::provider::remote::ORS_BASE_URL;
use super::routing::provider::{DEFAULT_PROFILE, DEFAULT_TIMEOUT_SECS};
use super::util::rate_limit::ORS_DIRECTIONS_PER_MINUTE;

pub const ENV_API_KEY: &str = "ORS_API_KEY";
pub const ENV_BASE_URL: &str = "ORS_BASE_URL";
pub const ENV_PROFILE: &str = "ORS_PROFILE";
pub const ENV_TIMEOUT_SECS: &str = "ORS_TIMEOUT_SECS";
pub const ENV_REQUESTS_PER_MINUTE: &str = "ORS_REQUESTS_PER_MINUTE";
pub const ENV_TILE_URL: &str = "MAP_TILE_URL";
pub const ENV_USER_AGENT: &str = "MAP_USER_AGENT";
pub const ENV_MAP_WIDTH: &str = "MAP_WIDTH";
pub const ENV_MAP_HEIGHT: &str = "MAP_HEIGHT";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No routing backend configured: set ORS_API_KEY (hosted) or ORS_BASE_URL (self-hosted)")]
    MissingApiKey,

    #[error("Invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

/// Which openrouteservice deployment to talk to.
#[derive(Clone, PartialEq, Eq)]
pub enum OrsConfig {
    Remote { api_key: String, base_url: String },
    Local { base_url: String },
}

// Keeps the credential out of logs.
impl fmt::Debug for OrsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote { base_url, .. } => f
                .debug_struct("Remote")
                .field("api_key", &"<redacted>")
                .field("base_url", base_url)
                .finish(),
            Self::Local { base_url } => f.debug_struct("Local").field("base_url", base_url).finish(),
        }
    }
}

impl OrsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(lookup(ENV_API_KEY));
        let base_url = non_empty(lookup(ENV_BASE_URL));
        match (api_key, base_url) {
            (Some(api_key), base_url) => Ok(Self::Remote {
                api_key,
                base_url: base_url.unwrap_or_else(|| ORS_BASE_URL.to_string()),
            }),
            (None, Some(base_url)) => Ok(Self::Local { base_url }),
            (None, None) => Err(ConfigError::MissingApiKey),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSettings {
    pub profile: String,
    pub timeout_secs: u64,
    pub requests_per_minute: u32,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            requests_per_minute: ORS_DIRECTIONS_PER_MINUTE,
        }
    }
}

impl RoutingSettings {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            profile: non_empty(lookup(ENV_PROFILE)).unwrap_or(defaults.profile),
            timeout_secs: positive(&lookup, ENV_TIMEOUT_SECS, defaults.timeout_secs)?,
            requests_per_minute: positive(
                &lookup,
                ENV_REQUESTS_PER_MINUTE,
                defaults.requests_per_minute,
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapConfig {
    /// Slippy-map URL template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    pub user_agent: String,
    pub width: u32,
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: DEFAULT_TILE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            width: DEFAULT_CANVAS_WIDTH,
            height: DEFAULT_CANVAS_HEIGHT,
        }
    }
}

impl MapConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            tile_url: non_empty(lookup(ENV_TILE_URL)).unwrap_or(defaults.tile_url),
            user_agent: non_empty(lookup(ENV_USER_AGENT)).unwrap_or(defaults.user_agent),
            width: positive(&lookup, ENV_MAP_WIDTH, defaults.width)?,
            height: positive(&lookup, ENV_MAP_HEIGHT, defaults.height)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub ors: OrsConfig,
    pub routing: RoutingSettings,
    pub map: MapConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            ors: OrsConfig::from_lookup(&lookup)?,
            routing: RoutingSettings::from_lookup(&lookup)?,
            map: MapConfig::from_lookup(&lookup)?,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default,
{
    match non_empty(lookup(key)) {
        None => Ok(default),
        Some(raw) => match raw.parse::<T>() {
            Ok(v) if v > T::default() => Ok(v),
            _ => Err(ConfigError::Invalid { key, value: raw }),
        },
    }
}
