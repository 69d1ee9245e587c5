//! # Slicestore
//!
//! A reactive state container split into named slices.
//!
//! One [`Store`] owns a state tree mapping slice names to JSON values. Code
//! works through slice handles that can only rewrite their own branch, and
//! observers subscribe either to every write or to a derived value.
//!
//! ## Store (state tree and listeners)
//!
//! - `Store` - holds the tree, notifies listeners after every committed write
//! - `Subscription` - idempotent handle to one listener registration
//!
//! ## Slices
//!
//! - `DefineStore`/`define_store` - lazily initialized, namespaced `Slice` handles
//! - `Slice::set_state` - merge a value or run a producer on a private copy
//! - `Slice::set_async_state` - the same with an async producer
//! - `TypedSlice` - slices described by a `StoreBase` type and serde
//!
//! ## Selectors
//!
//! - `Selector` - derived values that notify only when the value changes
//! - `StoreContext`/`use_store`/`use_selector` - ambient store resolution
//!
//! ```
//! use slicestore::{DefineStore, Store};
//! use serde_json::json;
//!
//! let store = Store::new();
//! let counter = DefineStore::new(store.clone()).define("counter", json!({ "value": 0 }));
//! let before = counter.get_state();
//!
//! counter.produce(|draft| draft["value"] = json!(1));
//!
//! assert_eq!(store.get_state().get("counter").unwrap()["value"], json!(1));
//! assert_eq!(*before, json!({ "value": 0 }));
//! ```

pub mod config;
pub mod error;
pub mod runtime;
pub mod selector;
pub mod state;
pub mod store;

// Re-export main types for convenience
pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use runtime::{use_selector, use_store, StoreContext};
pub use selector::{Identity, Selector};
pub use state::{merge, produce, Initial, StateTree, Update};
pub use store::{
    create_define_store, create_store, define_store, method, DefineStore, Enhancer,
    SerializedSlice, Slice, SliceMethod, Store, StoreBase, Subscription, Transition,
    TypedSlice,
};
