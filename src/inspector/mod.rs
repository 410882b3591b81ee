//! Inspector Module
//!
//! Optional debug view of the cache contents. The store only talks to it
//! through the [`Inspector`] hooks.

mod panel;

pub use panel::InspectorPanel;

// == Inspector Hooks ==
/// Hooks the store calls when cache tools are enabled.
pub trait Inspector<V>: Send + Sync {
    /// Creates the view's container. Called once, when tools get enabled.
    fn bootstrap(&self);

    /// Refreshes the view after a store operation or an expiration.
    ///
    /// `entries` is a snapshot sorted by key.
    fn render(&self, entries: &[(String, V)]);
}
