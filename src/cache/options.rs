//! Cache Options Module
//!
//! Configuration merged into a store and per-call `set` parameters.

use std::time::Duration;

// == Public Constants ==
/// Expiration window used until `configure` overrides it (5 minutes).
pub const DEFAULT_EXPIRE_IN: Duration = Duration::from_millis(300_000);

// == Configure Options ==
/// Options accepted by `CacheStore::configure`.
///
/// Only present and truthy values are applied; anything else leaves the
/// current configuration untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigureOptions {
    /// Overrides the default expiration window. Zero is ignored.
    pub default_expire_in: Option<Duration>,
    /// Enables the inspector render hook. `Some(false)` is ignored.
    pub with_cache_tools: Option<bool>,
}

impl ConfigureOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_expire_in(mut self, expire_in: Duration) -> Self {
        self.default_expire_in = Some(expire_in);
        self
    }

    pub fn with_cache_tools(mut self, enabled: bool) -> Self {
        self.with_cache_tools = Some(enabled);
        self
    }

    /// Default expiration override, if it should be applied.
    pub(crate) fn effective_expire_in(&self) -> Option<Duration> {
        self.default_expire_in.filter(|d| !d.is_zero())
    }

    /// True when this configuration asks to turn the tools on.
    pub(crate) fn enables_tools(&self) -> bool {
        self.with_cache_tools.unwrap_or(false)
    }
}

// == Set Params ==
/// Per-call parameters for `CacheStore::set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetParams {
    /// Expiration window for this entry. Absent or zero uses the default.
    pub expire_in: Option<Duration>,
}

impl SetParams {
    pub fn expire_in(expire_in: Duration) -> Self {
        Self {
            expire_in: Some(expire_in),
        }
    }

    pub(crate) fn resolve(&self, default: Duration) -> Duration {
        self.expire_in.filter(|d| !d.is_zero()).unwrap_or(default)
    }
}
