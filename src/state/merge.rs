use serde_json::Value;
use std::fmt;

/// A function editing a draft of a slice's state in place.
pub type Producer = Box<dyn FnOnce(&mut Value)>;

/// Description of a slice transition.
pub enum Update {
    /// Shallow-merged into the previous state when both are objects,
    /// otherwise replaces it.
    Merge(Value),
    /// Edits a private copy of the previous state.
    Produce(Producer),
}

impl Update {
    /// Wrap a draft-editing closure.
    pub fn produce<F>(producer: F) -> Self
    where
        F: FnOnce(&mut Value) + 'static,
    {
        Update::Produce(Box::new(producer))
    }

    /// Compute the next state from `previous`. An absent previous state is
    /// treated as `null`.
    pub fn apply(self, previous: Option<&Value>) -> Value {
        match self {
            Update::Merge(next) => merge(previous, next),
            Update::Produce(producer) => produce(previous.unwrap_or(&Value::Null), producer),
        }
    }
}

impl From<Value> for Update {
    fn from(value: Value) -> Self {
        Update::Merge(value)
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Merge(value) => f.debug_tuple("Merge").field(value).finish(),
            Update::Produce(_) => f.write_str("Produce(..)"),
        }
    }
}

/// Shallow field-wise union of `previous` and `next`, `next` winning.
///
/// Only applies when both are JSON objects; any other combination (including
/// a missing previous state) yields `next` unchanged.
pub fn merge(previous: Option<&Value>, next: Value) -> Value {
    match (previous, next) {
        (Some(Value::Object(previous)), Value::Object(next)) => {
            let mut merged = previous.clone();
            merged.extend(next);
            Value::Object(merged)
        }
        (_, next) => next,
    }
}

/// Copy-on-write application of a producer.
///
/// The producer only ever sees a private clone; `previous` is left untouched.
pub fn produce<F>(previous: &Value, producer: F) -> Value
where
    F: FnOnce(&mut Value),
{
    let mut draft = previous.clone();
    producer(&mut draft);
    draft
}

/// Initial state of a slice, evaluated only when the slice is absent.
pub enum Initial {
    Value(Value),
    Lazy(Box<dyn FnOnce() -> Value>),
}

impl Initial {
    /// Initial state computed on first definition only.
    pub fn lazy<F>(init: F) -> Self
    where
        F: FnOnce() -> Value + 'static,
    {
        Initial::Lazy(Box::new(init))
    }

    /// Evaluate the initial state.
    pub fn resolve(self) -> Value {
        match self {
            Initial::Value(value) => value,
            Initial::Lazy(init) => init(),
        }
    }
}

impl From<Value> for Initial {
    fn from(value: Value) -> Self {
        Initial::Value(value)
    }
}

impl fmt::Debug for Initial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Initial::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Initial::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}
