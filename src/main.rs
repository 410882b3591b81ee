//! Cache Machine demo
//!
//! Walks a cache through its lifecycle while logging every event, then
//! prints the inspector panel markup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_machine::{CacheStore, Config, ConfigureOptions, EventKind, InspectorPanel, SetParams};

/// Main entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the store with an inspector panel attached
/// 4. Log every lifecycle event
/// 5. Set, read, expire, remove and destroy entries
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_machine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::try_from_env().context("loading cache configuration")?;
    info!(
        "Configuration loaded: default_expire_in={}ms, with_cache_tools={}",
        config.default_expire_in.as_millis(),
        config.with_cache_tools
    );

    let panel = Arc::new(InspectorPanel::new());
    let store = CacheStore::<serde_json::Value>::builder()
        .inspector(panel.clone())
        .build()
        .context("creating cache store")?;
    store.configure(config.to_options());

    for kind in EventKind::ALL {
        store.on(kind, |event| {
            info!(
                kind = %event.kind,
                key = event.key.as_deref().unwrap_or("-"),
                value = ?event.value,
                "{}", event.message
            );
        });
    }

    store.configure(
        ConfigureOptions::new()
            .default_expire_in(Duration::from_millis(1000))
            .with_cache_tools(true),
    );

    store.set("a", serde_json::json!(42), SetParams::default())?;
    store.set(
        "user",
        serde_json::json!({ "name": "Ada", "roles": ["admin"] }),
        SetParams::expire_in(Duration::from_secs(10)),
    )?;
    info!("a = {:?}", store.get("a")?);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    info!("after expiry: a = {:?}, keys = {:?}", store.get("a")?, store.keys());

    if let Some(markup) = panel.markup() {
        println!("{markup}");
    }

    store.remove("user")?;
    store.destroy()?;
    info!("Demo complete");
    Ok(())
}
