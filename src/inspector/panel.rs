//! Inspector Panel
//!
//! Renders cache entries as an HTML fragment a host page can mount.

use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use super::Inspector;

/// Id of the root element the panel mounts into.
pub const ROOT_ID: &str = "cache_id";

#[derive(Debug, Default)]
struct PanelState {
    /// Content markup; `None` until bootstrapped.
    content: Option<String>,
    hidden: bool,
}

// == Inspector Panel ==
/// HTML panel listing every key with its pretty-printed JSON value.
#[derive(Debug, Default)]
pub struct InspectorPanel {
    state: Mutex<PanelState>,
}

impl InspectorPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the container has been created.
    pub fn is_mounted(&self) -> bool {
        self.lock().content.is_some()
    }

    // == Toggle ==
    /// Shows or hides the content area, like the panel's action button.
    pub fn toggle(&self) {
        let mut state = self.lock();
        state.hidden = !state.hidden;
    }

    pub fn is_hidden(&self) -> bool {
        self.lock().hidden
    }

    // == Markup ==
    /// Full markup of the panel, or `None` before bootstrap.
    pub fn markup(&self) -> Option<String> {
        let state = self.lock();
        let content = state.content.as_ref()?;
        let class = if state.hidden { "content hide" } else { "content" };

        Some(format!(
            "<div id='{ROOT_ID}'>\
             <div class='panel'>\
             <div class='actions' style='color: #ff6262'>\
             <div class='button'>╼</div>\
             </div>\
             <div class='{class}'>{content}</div>\
             </div>\
             </div>"
        ))
    }

    fn lock(&self) -> MutexGuard<'_, PanelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Serialize> Inspector<V> for InspectorPanel {
    fn bootstrap(&self) {
        let mut state = self.lock();
        if state.content.is_none() {
            state.content = Some(String::new());
            debug!("inspector panel mounted");
        }
    }

    fn render(&self, entries: &[(String, V)]) {
        let mut state = self.lock();
        let Some(content) = state.content.as_mut() else {
            return;
        };
        *content = render_entries(entries);
    }
}

fn render_entries<V: Serialize>(entries: &[(String, V)]) -> String {
    if entries.is_empty() {
        return r#"<div class="empty">Cache is empty</div>"#.to_string();
    }

    let mut out = String::new();
    for (key, value) in entries {
        let value = serde_json::to_string_pretty(value).unwrap_or_else(|err| {
            warn!(key = %key, error = %err, "failed to serialize cache value");
            format!("<unserializable: {err}>")
        });
        let _ = write!(
            out,
            "<div class='element'><div>Key: {}</div><div>Value: {}</div></div>",
            escape_html(key),
            escape_html(&value)
        );
    }
    out
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
