//! Cache Module
//!
//! Provides the in-memory key/value store with per-key expiration timers.

mod options;
mod store;
pub mod timer;


// Re-export public types
pub use options::{ConfigureOptions, SetParams, DEFAULT_EXPIRE_IN};
pub use store::{CacheStore, CacheStoreBuilder};
pub use timer::{ScheduledTask, Scheduler, TokioScheduler};
