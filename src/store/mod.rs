//! The state container and the slice handles built on top of it.
//!
//! - `Store`: owns the state tree, the listeners and the slice registry
//! - `DefineStore`/`Slice`: namespaced handles with lazy initialization
//! - `TypedSlice`: the same lifecycle for types implementing `StoreBase`
//! - `SerializedSlice`: opt-in queueing of async transitions

mod base;
mod define;
mod serial;
mod store;
mod transition;

pub use base::{StoreBase, TypedSlice};
pub use define::{create_define_store, define_store, method, DefineStore, Enhancer, Slice};
pub use serial::SerializedSlice;
pub use store::{create_store, SliceMethod, Store, Subscription, WeakStore};
pub use transition::{Transition, TransitionHook};
