//! Integration Tests for the Cache Store
//!
//! Exercises the public API end to end on Tokio's paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cache_machine::{
    CacheError, CacheEvent, CacheStore, ConfigureOptions, EventBus, EventKind, InspectorPanel,
    SetParams,
};
use tokio::time::sleep;
use tokio_test::{assert_err, assert_ok};

// == Helper Functions ==

fn create_store() -> CacheStore<i32> {
    CacheStore::new().unwrap()
}

fn record(store: &CacheStore<i32>, kind: EventKind) -> Arc<Mutex<Vec<CacheEvent<i32>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    store.on(kind, move |event| sink.lock().unwrap().push(event.clone()));
    seen
}

// == Expiration Scenarios ==

#[tokio::test(start_paused = true)]
async fn test_default_expiration_scenario() {
    let store = create_store();
    store.configure(ConfigureOptions::new().default_expire_in(Duration::from_millis(1000)));

    assert_ok!(store.set("a", 42, SetParams::default()));
    assert_eq!(store.get("a").unwrap(), Some(42));

    sleep(Duration::from_millis(1500)).await;

    assert_eq!(store.get("a").unwrap(), None);
    assert!(store.keys().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reset_before_expiry_keeps_entry() {
    let store = create_store();

    store.set("k", 1, SetParams::expire_in(Duration::from_millis(1))).unwrap();
    store.set("k", 1, SetParams::expire_in(Duration::from_millis(10))).unwrap();

    sleep(Duration::from_millis(5)).await;
    assert!(store.has("k"));

    sleep(Duration::from_millis(10)).await;
    assert!(!store.has("k"));
}

#[tokio::test(start_paused = true)]
async fn test_expiration_emits_no_events() {
    let store = create_store();
    let removes = record(&store, EventKind::Remove);
    let destroys = record(&store, EventKind::Destroy);

    store.set("k", 1, SetParams::expire_in(Duration::from_millis(100))).unwrap();
    sleep(Duration::from_millis(200)).await;

    assert!(!store.has("k"));
    assert!(removes.lock().unwrap().is_empty());
    assert!(destroys.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_keys_expire_independently() {
    let store = create_store();

    store.set("fast", 1, SetParams::expire_in(Duration::from_millis(10))).unwrap();
    store.set("slow", 2, SetParams::expire_in(Duration::from_millis(100))).unwrap();

    sleep(Duration::from_millis(50)).await;
    assert_eq!(store.keys(), vec!["slow".to_string()]);

    sleep(Duration::from_millis(100)).await;
    assert!(store.is_empty());
}

// == Basic Operations ==

#[tokio::test(start_paused = true)]
async fn test_overwrite_scenario() {
    let store = create_store();

    store.set("x", 1, SetParams::default()).unwrap();
    store.set("x", 2, SetParams::default()).unwrap();

    assert_eq!(store.get("x").unwrap(), Some(2));
    assert_eq!(store.keys(), vec!["x".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_remove_then_absent() {
    let store = create_store();

    store.set("a", 1, SetParams::default()).unwrap();
    assert_ok!(store.remove("a"));

    assert!(!store.has("a"));
    assert_eq!(store.get("a").unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_then_everything_absent() {
    let store = create_store();

    for (i, key) in ["a", "b", "c"].iter().enumerate() {
        store.set(*key, i as i32, SetParams::default()).unwrap();
    }
    assert_ok!(store.destroy());

    assert!(store.keys().is_empty());
    for key in ["a", "b", "c"] {
        assert!(!store.has(key));
        assert_eq!(store.get(key).unwrap(), None);
    }
}

#[tokio::test(start_paused = true)]
async fn test_cloned_handles_share_state() {
    let store = create_store();
    let other = store.clone();

    store.set("shared", 7, SetParams::default()).unwrap();
    assert_eq!(other.get("shared").unwrap(), Some(7));
}

// == Events ==

#[tokio::test(start_paused = true)]
async fn test_set_event_payload() {
    let store = create_store();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    let _sub = store.events().subscribe(EventKind::Set, move |event| {
        sink.lock().unwrap().push(event.clone());
        Ok(())
    });

    store.set("a", 1, SetParams::default()).unwrap();

    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].key.as_deref(), Some("a"));
    assert_eq!(calls[0].value, Some(1));
    assert_eq!(calls[0].message, "Cache has been updated");
}

#[tokio::test(start_paused = true)]
async fn test_get_event_reports_absent_value() {
    let store = create_store();
    let gets = record(&store, EventKind::Get);

    store.get("missing").unwrap();

    let gets = gets.lock().unwrap();
    assert_eq!(gets[0].key.as_deref(), Some("missing"));
    assert_eq!(gets[0].value, None);
}

#[tokio::test(start_paused = true)]
async fn test_remove_event_reports_value_after_deletion() {
    let store = create_store();
    let removes = record(&store, EventKind::Remove);

    store.set("a", 1, SetParams::default()).unwrap();
    store.remove("a").unwrap();

    let removes = removes.lock().unwrap();
    assert_eq!(removes.len(), 1);
    assert_eq!(removes[0].key.as_deref(), Some("a"));
    assert_eq!(removes[0].value, None);
}

#[tokio::test(start_paused = true)]
async fn test_destroy_event_has_no_key() {
    let store = create_store();
    let destroys = record(&store, EventKind::Destroy);

    store.destroy().unwrap();

    let destroys = destroys.lock().unwrap();
    assert_eq!(destroys.len(), 1);
    assert!(destroys[0].key.is_none());
    assert!(destroys[0].value.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_unsubscribed_listener_not_invoked() {
    let store = create_store();
    let first = Arc::new(Mutex::new(0));
    let second = Arc::new(Mutex::new(0));

    let first_sink = first.clone();
    let sub = store.events().subscribe(EventKind::Set, move |_| {
        *first_sink.lock().unwrap() += 1;
        Ok(())
    });
    let second_sink = second.clone();
    let _keep = store.events().subscribe(EventKind::Set, move |_| {
        *second_sink.lock().unwrap() += 1;
        Ok(())
    });

    sub.unsubscribe();
    store.set("a", 1, SetParams::default()).unwrap();

    assert_eq!(*first.lock().unwrap(), 0);
    assert_eq!(*second.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_listener_error_propagates_after_mutation() {
    let store = create_store();
    let _sub = store
        .events()
        .subscribe(EventKind::Set, |_| Err("listener rejected".into()));

    let result = store.set("a", 1, SetParams::default());

    assert!(matches!(
        assert_err!(result),
        CacheError::Listener { kind: EventKind::Set, .. }
    ));
    // The write itself already happened
    assert_eq!(store.get("a").unwrap(), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_stores_are_independent_unless_bus_shared() {
    let bus = Arc::new(EventBus::new());
    let first = CacheStore::<i32>::builder().bus(bus.clone()).build().unwrap();
    let second = CacheStore::<i32>::builder().bus(bus.clone()).build().unwrap();
    let isolated = create_store();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _sub = bus.subscribe(EventKind::Set, move |event| {
        sink.lock().unwrap().push(event.key.clone());
        Ok(())
    });

    first.set("one", 1, SetParams::default()).unwrap();
    second.set("two", 2, SetParams::default()).unwrap();
    isolated.set("three", 3, SetParams::default()).unwrap();

    assert!(!first.has("two"));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("one".to_string()), Some("two".to_string())]
    );
}

// == Inspector ==

#[tokio::test(start_paused = true)]
async fn test_inspector_mirrors_cache() {
    let panel = Arc::new(InspectorPanel::new());
    let store = CacheStore::<i32>::builder()
        .inspector(panel.clone())
        .build()
        .unwrap();

    store.set("before", 1, SetParams::default()).unwrap();
    assert!(panel.markup().is_none());

    store.configure(ConfigureOptions::new().with_cache_tools(true));
    let markup = panel.markup().unwrap();
    assert!(markup.contains("Key: before"));
    assert!(markup.contains("Value: 1"));

    store.destroy().unwrap();
    assert!(panel.markup().unwrap().contains("Cache is empty"));
}
