//! Events Module
//!
//! Publish/subscribe registry for cache lifecycle notifications.

mod bus;
mod event;

// Re-export public types
pub use bus::{EventBus, Listener, Subscription};
pub use event::{CacheEvent, EventKind};
