//! Configuration Module
//!
//! Loads cache configuration from environment variables.

use std::env;
use std::time::Duration;

use tracing::warn;

use crate::cache::{ConfigureOptions, DEFAULT_EXPIRE_IN};
use crate::error::{CacheError, Result};

const ENV_DEFAULT_EXPIRE_IN_MS: &str = "CACHE_DEFAULT_EXPIRE_IN_MS";
const ENV_WITH_TOOLS: &str = "CACHE_WITH_TOOLS";

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Expiration window for entries set without an explicit one
    pub default_expire_in: Duration,
    /// Whether the inspector panel is enabled
    pub with_cache_tools: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// Values that fail to parse are logged and replaced by their default.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_EXPIRE_IN_MS` - Default expiration in milliseconds (default: 300000)
    /// - `CACHE_WITH_TOOLS` - Enable the inspector panel: true/false/1/0 (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Like [`Config::from_env`], but rejects unparseable values.
    pub fn try_from_env() -> Result<Self> {
        Self::try_from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            default_expire_in: parse_expire_in(lookup(ENV_DEFAULT_EXPIRE_IN_MS))
                .unwrap_or_else(|err| {
                    warn!(error = %err, "using default expiration window");
                    None
                })
                .unwrap_or(defaults.default_expire_in),
            with_cache_tools: parse_flag(lookup(ENV_WITH_TOOLS))
                .unwrap_or_else(|err| {
                    warn!(error = %err, "cache tools left disabled");
                    None
                })
                .unwrap_or(defaults.with_cache_tools),
        }
    }

    fn try_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            default_expire_in: parse_expire_in(lookup(ENV_DEFAULT_EXPIRE_IN_MS))?
                .unwrap_or(defaults.default_expire_in),
            with_cache_tools: parse_flag(lookup(ENV_WITH_TOOLS))?
                .unwrap_or(defaults.with_cache_tools),
        })
    }

    /// Options to hand to `CacheStore::configure`.
    pub fn to_options(&self) -> ConfigureOptions {
        ConfigureOptions::new()
            .default_expire_in(self.default_expire_in)
            .with_cache_tools(self.with_cache_tools)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_expire_in: DEFAULT_EXPIRE_IN,
            with_cache_tools: false,
        }
    }
}

fn parse_expire_in(raw: Option<String>) -> Result<Option<Duration>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|ms| Some(Duration::from_millis(ms)))
        .map_err(|_| {
            CacheError::InvalidConfig(format!(
                "{ENV_DEFAULT_EXPIRE_IN_MS}={raw} is not a number of milliseconds"
            ))
        })
}

fn parse_flag(raw: Option<String>) -> Result<Option<bool>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
        _ => Err(CacheError::InvalidConfig(format!(
            "{ENV_WITH_TOOLS}={raw} is not a boolean"
        ))),
    }
}
