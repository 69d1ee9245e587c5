//! State values and the pure transition functions over them.
//!
//! This module provides the leaves of the store:
//! - `StateTree`: an immutable snapshot of every slice
//! - `Update`/`Initial`: tagged descriptions of a slice transition
//! - `merge`/`produce`: the pure functions computing a slice's next state

mod merge;
mod tree;

pub use merge::{merge, produce, Initial, Producer, Update};
pub use tree::StateTree;
