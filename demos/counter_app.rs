//! Complete counter application demonstrating all features together

use serde::{Deserialize, Serialize};
use serde_json::json;
use slicestore::{
    create_define_store, method, use_selector, DefineStore, Store, StoreBase, StoreContext,
    Transition, TypedSlice,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct CounterState {
    count: i64,
    step: i64,
    history: Vec<i64>,
}

struct Counter;

impl StoreBase for Counter {
    const NAME: &'static str = "counter";
    type State = CounterState;

    fn initial() -> CounterState {
        CounterState {
            count: 0,
            step: 1,
            history: vec![0],
        }
    }
}

fn logged(base: DefineStore) -> slicestore::Result<DefineStore> {
    Ok(base.with_hook(|transition: &Transition| {
        println!("   [{}] -> {}", transition.action(), transition.next);
    }))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> slicestore::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Complete Counter Application ===\n");

    let store = Store::new();

    StoreContext::provide(store.clone(), || -> slicestore::Result<()> {
        println!("1. Initializing counter slice");
        let define = create_define_store(None, Some(&logged))?;
        let counter = TypedSlice::<Counter>::with_factory(&define)?;
        store.register(counter.slice())?;

        println!("\n2. Watching the count");
        let _count = use_selector(
            |state| state.get("counter").and_then(|c| c["count"].as_i64()),
            || println!("   [selector] count changed"),
        );

        println!("\n3. Registering counter methods");
        counter.slice().regist([(
            "reset",
            method(|slice, _| {
                (*slice.produce(|draft| {
                    draft["count"] = json!(0);
                    if let Some(history) = draft["history"].as_array_mut() {
                        history.push(json!(0));
                    }
                }))
                .clone()
            }),
        )]);

        println!("\n4. Incrementing...");
        for _ in 0..3 {
            counter.update(|state| {
                state.count += state.step;
                state.history.push(state.count);
            })?;
        }

        println!("\n5. Changing step size to 5 (selector stays quiet)");
        counter.update(|state| state.step = 5)?;

        println!("\n6. Decrementing...");
        counter.update(|state| {
            state.count -= state.step;
            state.history.push(state.count);
        })?;

        println!("\n7. History: {:?}", counter.state()?.history);

        println!("\n8. Resetting through the registered method...");
        store.call("counter", "reset", json!(null))?;
        println!("   Final history: {:?}", counter.state()?.history);
        Ok(())
    })?;

    println!("\n9. Async step update");
    let counter = DefineStore::new(store.clone()).define("counter", json!({}));
    counter
        .set_async_state(|mut draft| async move {
            tokio::task::yield_now().await;
            draft["step"] = json!(10);
            draft
        })
        .await;
    println!("   Step is now {}", counter.get_state()["step"]);

    println!("\n✓ Counter application complete!");
    Ok(())
}
