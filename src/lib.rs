//! Cache Machine - an in-process expiring key/value cache
//!
//! Entries expire on per-key timers; lifecycle events (`set`, `get`,
//! `remove`, `destroy`) are published on an event bus, and an optional
//! inspector panel can mirror the cache contents.

pub mod cache;
pub mod config;
pub mod error;
pub mod events;
pub mod inspector;

pub use cache::{CacheStore, ConfigureOptions, SetParams};
pub use config::Config;
pub use error::{CacheError, Result};
pub use events::{CacheEvent, EventBus, EventKind, Subscription};
pub use inspector::{Inspector, InspectorPanel};
