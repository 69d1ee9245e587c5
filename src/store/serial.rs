use crate::store::define::Slice;
use serde_json::Value;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

/// Slice handle whose async transitions are queued behind each other.
///
/// Every serialized handle of the same slice on the same store shares one
/// gate, so a transition only captures its starting state once the previous
/// one has committed. Synchronous writes through [`Slice::set_state`] are not
/// gated.
#[derive(Clone)]
pub struct SerializedSlice {
    slice: Slice,
    gate: Arc<tokio::sync::Mutex<()>>,
}

impl SerializedSlice {
    pub(crate) fn new(slice: Slice) -> Self {
        let gate = slice.store().gate(slice.name());
        Self { slice, gate }
    }

    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    /// Queue an asynchronous producer behind earlier serialized transitions.
    #[track_caller]
    pub fn set_async_state<F, Fut>(&self, producer: F) -> impl Future<Output = Arc<Value>>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = Value>,
    {
        let location = Location::caller();
        let slice = self.slice.clone();
        let gate = Arc::clone(&self.gate);
        async move {
            let _turn = gate.lock().await;
            let previous = slice.try_state();
            let draft = previous.as_deref().cloned().unwrap_or(Value::Null);
            let next = producer(draft).await;
            slice.commit(previous, next, location, true)
        }
    }
}
