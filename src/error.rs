//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::events::EventKind;

/// Error type a listener may return to abort an emit.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Absent keys are never errors; reads of a missing key yield `None`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// A subscribed listener failed while an event was being emitted.
    /// Listeners registered after the failing one were not invoked.
    #[error("listener for '{kind}' event failed: {source}")]
    Listener {
        kind: EventKind,
        #[source]
        source: ListenerError,
    },

    /// No Tokio runtime is available to drive expiration timers
    #[error("no Tokio runtime available for expiration timers")]
    NoRuntime,

    /// Event kind name outside of set/get/remove/destroy
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),

    /// Configuration value could not be interpreted
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_error_display() {
        let err = CacheError::Listener {
            kind: EventKind::Set,
            source: "boom".into(),
        };
        assert_eq!(err.to_string(), "listener for 'set' event failed: boom");
    }

    #[test]
    fn test_listener_error_exposes_source() {
        use std::error::Error as _;

        let err = CacheError::Listener {
            kind: EventKind::Remove,
            source: "inner".into(),
        };
        assert_eq!(err.source().map(|s| s.to_string()), Some("inner".into()));
    }
}
