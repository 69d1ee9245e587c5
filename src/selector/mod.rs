//! Derived-value subscriptions.
//!
//! A `Selector` derives a value from the state tree and only notifies its
//! owner when that value stops being identical to the previous one.

mod identity;
mod selector;

pub use identity::Identity;
pub use selector::Selector;
