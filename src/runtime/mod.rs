//! Ambient store resolution.
//!
//! This module provides the scoped lookup of "the current store" for code
//! that is not handed a store explicitly.

mod context;

pub use context::{use_selector, use_store, StoreContext};
