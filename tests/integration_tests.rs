//! Integration tests for Slicestore

use serde_json::{json, Value};
use slicestore::{
    create_define_store, create_store, method, DefineStore, Enhancer, Initial, Selector, Store,
    StoreContext, StoreError, Transition,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

fn counting() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    (count, move || {
        count_clone.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn partial_updates_leave_other_slices_unchanged() {
    let store = Store::with_state([
        ("a", json!({ "x": 1 })),
        ("b", json!([1, 2, 3])),
        ("c", json!("text")),
    ]);
    let before = store.get_state();

    store.set_state([("a", json!({ "y": 2 })), ("d", json!(null))]);

    let after = store.get_state();
    for name in ["b", "c"] {
        assert!(Arc::ptr_eq(before.get(name).unwrap(), after.get(name).unwrap()));
    }
    assert_eq!(**after.get("a").unwrap(), json!({ "x": 1, "y": 2 }));
    assert!(after.contains("d"));
}

#[test]
fn producer_update_keeps_previous_snapshot() {
    let store = create_store();
    let counter = DefineStore::new(store.clone()).define("counter", json!({ "value": 0 }));
    let snapshot = counter.get_state();

    counter.produce(|draft| {
        let value = draft["value"].as_i64().unwrap_or_default();
        draft["value"] = json!(value + 1);
    });

    assert_eq!(store.get_state().get("counter").unwrap()["value"], json!(1));
    assert_eq!(*snapshot, json!({ "value": 0 }));
}

#[test]
fn subscribe_and_unsubscribe() {
    let store = create_store();
    let (count, listener) = counting();
    let unsub = store.subscribe(listener);

    store.set_state([("a", json!(1))]);
    assert_eq!(count.load(Ordering::SeqCst), 1);

    unsub.unsubscribe();
    store.set_state([("a", json!(2))]);
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn immediate_unsubscribe_never_notifies() {
    let store = create_store();
    let (count, listener) = counting();
    store.subscribe(listener).unsubscribe();

    let counter = DefineStore::new(store.clone()).define("counter", json!(0));
    counter.set_state(json!(1));
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn redefining_a_slice_keeps_its_state() {
    let define = DefineStore::new(create_store());
    let counter = define.define("counter", json!(0));
    counter.set_state(json!({ "count": 1 }));

    define.define("counter", json!(0));
    assert_eq!(define.store().get_state().get("counter").unwrap()["count"], json!(1));
}

#[test]
fn initialization_notifies_listeners() {
    let store = create_store();
    let (count, listener) = counting();
    let _sub = store.subscribe(listener);

    let define = DefineStore::new(store);
    define.define("a", Initial::lazy(|| json!({ "ready": true })));
    define.define("a", json!({ "ready": false }));

    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn selector_skips_reference_equal_slices() {
    let store = create_store();
    let define = DefineStore::new(store.clone());
    let todos = define.define("todos", json!([]));
    let filter = define.define("filter", json!("all"));

    let (count, on_change) = counting();
    let selected = Selector::new(&store, |state| state.slice("todos"), on_change);

    filter.set_state(json!("done"));
    filter.set_state(json!("open"));
    assert_eq!(count.load(Ordering::SeqCst), 0);

    todos.produce(|draft| {
        if let Some(items) = draft.as_array_mut() {
            items.push(json!("write tests"));
        }
    });
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(*selected.get().unwrap(), json!(["write tests"]));
}

#[test]
fn selector_listener_writes_are_visible() {
    let store = create_store();
    let define = DefineStore::new(store.clone());
    let source = define.define("source", json!(0));
    let mirror = define.define("mirror", json!(0));

    let _selected = Selector::new(
        &store,
        |state| state.get("source").and_then(|value| value.as_i64()),
        {
            let mirror = mirror.clone();
            let source = source.clone();
            move || {
                mirror.set_state((*source.get_state()).clone());
            }
        },
    );

    source.set_state(json!(5));
    assert_eq!(*mirror.get_state(), json!(5));
}

#[test]
fn registered_methods_operate_on_their_slice() {
    let store = create_store();
    let todos = DefineStore::new(store.clone()).define("todos", json!({ "items": [] }));
    todos.regist([(
        "add",
        method(|slice, args| {
            let next = slice.produce(|draft| {
                if let Some(items) = draft["items"].as_array_mut() {
                    items.push(args);
                }
            });
            Value::from(next["items"].as_array().map_or(0, Vec::len))
        }),
    )]);

    assert_eq!(store.call("todos", "add", json!("a")).unwrap(), json!(1));
    assert_eq!(todos.call("add", json!("b")).unwrap(), json!(2));
    assert_eq!(*todos.get_state(), json!({ "items": ["a", "b"] }));
}

struct Recording(Arc<Mutex<Vec<String>>>);

impl Enhancer for Recording {
    fn enhance(&self, base: DefineStore) -> slicestore::Result<DefineStore> {
        let log = self.0.clone();
        Ok(base.with_hook(move |transition: &Transition| {
            log.lock().unwrap().push(transition.slice.to_string());
        }))
    }
}

#[test]
fn enhancer_hooks_observe_transitions() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let define = create_define_store(Some(create_store()), Some(&Recording(log.clone()))).unwrap();

    let counter = define.define("counter", json!(0));
    counter.set_state(json!(1));
    define.define("user", json!({}));

    assert_eq!(*log.lock().unwrap(), vec!["counter", "counter", "user"]);
}

#[test]
fn rejecting_enhancer_fails_construction() {
    struct Disabled;

    impl Enhancer for Disabled {
        fn enhance(&self, _: DefineStore) -> slicestore::Result<DefineStore> {
            Err(StoreError::DuplicateSlice {
                name: "counter".to_string(),
            })
        }
    }

    let err = create_define_store(None, Some(&Disabled)).unwrap_err();
    assert!(matches!(err, StoreError::Config(_)));
}

#[test]
fn provided_store_isolates_from_global() {
    let store = create_store();
    let counter = StoreContext::provide(store.clone(), || {
        slicestore::define_store("isolated-counter", json!(0))
    });
    counter.set_state(json!(3));

    assert!(counter.store().ptr_eq(&store));
    assert!(!StoreContext::global().get_state().contains("isolated-counter"));
}

#[tokio::test]
async fn async_transition_commits_and_resolves() {
    let store = create_store();
    let counter = DefineStore::new(store.clone()).define("counter", json!({ "value": 0 }));
    let (count, listener) = counting();
    let _sub = store.subscribe(listener);

    let committed = counter
        .set_async_state(|mut draft| async move {
            tokio::task::yield_now().await;
            draft["value"] = json!(10);
            draft
        })
        .await;

    assert_eq!(*committed, json!({ "value": 10 }));
    assert!(Arc::ptr_eq(&committed, &counter.get_state()));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn overlapping_async_transitions_lose_updates() {
    let store = create_store();
    let slice = DefineStore::new(store.clone()).define("flags", json!({}));

    let first = slice.set_async_state(|mut draft| async move {
        draft["a"] = json!(true);
        draft
    });
    let second = slice.set_async_state(|mut draft| async move {
        draft["b"] = json!(true);
        draft
    });

    // Both captured `{}`; the first to be awaited commits first and the
    // other one overwrites it.
    second.await;
    first.await;

    assert_eq!(*slice.get_state(), json!({ "a": true }));
}

#[tokio::test]
async fn sync_write_during_async_transition_is_overwritten() {
    let slice = DefineStore::new(create_store()).define("profile", json!({ "name": "ada" }));

    let pending = slice.set_async_state(|mut draft| async move {
        tokio::task::yield_now().await;
        draft["age"] = json!(36);
        draft
    });
    slice.set_state(json!({ "email": "ada@example.com" }));
    pending.await;

    assert_eq!(*slice.get_state(), json!({ "name": "ada", "age": 36 }));
}

#[tokio::test]
async fn serialized_transitions_integrate_both_edits() {
    let slice = DefineStore::new(create_store()).define("flags", json!({}));
    let queued = slice.serialized();

    let first = queued.set_async_state(|mut draft| async move {
        draft["a"] = json!(true);
        draft
    });
    let second = queued.set_async_state(|mut draft| async move {
        draft["b"] = json!(true);
        draft
    });
    second.await;
    first.await;

    assert_eq!(*slice.get_state(), json!({ "a": true, "b": true }));
}
