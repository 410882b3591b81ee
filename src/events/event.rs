//! Cache Event Module
//!
//! Defines event kinds and the payload delivered to listeners.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CacheError;

// == Event Kind ==
/// Closed set of lifecycle notifications emitted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Set,
    Get,
    Remove,
    Destroy,
}

impl EventKind {
    /// All event kinds, in declaration order.
    pub const ALL: [EventKind; 4] = [
        EventKind::Set,
        EventKind::Get,
        EventKind::Remove,
        EventKind::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Set => "set",
            EventKind::Get => "get",
            EventKind::Remove => "remove",
            EventKind::Destroy => "destroy",
        }
    }

    /// Human readable message attached to every event of this kind.
    pub fn message(&self) -> &'static str {
        match self {
            EventKind::Set => "Cache has been updated",
            EventKind::Get => "Cache has been returned",
            EventKind::Remove => "Cache has been removed",
            EventKind::Destroy => "Cache has been destroyed",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "set" => Ok(EventKind::Set),
            "get" => Ok(EventKind::Get),
            "remove" => Ok(EventKind::Remove),
            "destroy" => Ok(EventKind::Destroy),
            other => Err(CacheError::UnknownEventKind(other.to_string())),
        }
    }
}

// == Cache Event ==
/// Payload passed to listeners.
///
/// `destroy` events carry neither key nor value. A `remove` event reports
/// the value as observed after deletion, which is always `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEvent<V> {
    pub kind: EventKind,
    pub message: &'static str,
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<V>,
}

impl<V> CacheEvent<V> {
    /// Creates an event about a single key, timestamped now.
    pub fn keyed(kind: EventKind, key: impl Into<String>, value: Option<V>) -> Self {
        Self {
            kind,
            message: kind.message(),
            time: Utc::now(),
            key: Some(key.into()),
            value,
        }
    }

    /// Creates an event that concerns the whole cache (no key, no value).
    pub fn global(kind: EventKind) -> Self {
        Self {
            kind,
            message: kind.message(),
            time: Utc::now(),
            key: None,
            value: None,
        }
    }
}
