use crate::error::{Result, StoreError};
use crate::runtime::StoreContext;
use crate::state::{produce, Initial, Update};
use crate::store::serial::SerializedSlice;
use crate::store::store::{SliceMethod, Store, Subscription};
use crate::store::transition::{log_transition, Transition, TransitionHook};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

/// Factory of slice handles bound to one store.
///
/// Transition hooks installed on the factory are shared by every slice it
/// defines.
#[derive(Clone)]
pub struct DefineStore {
    store: Store,
    hooks: Vec<TransitionHook>,
}

impl DefineStore {
    /// Factory with no hooks bound to `store`.
    pub fn new(store: Store) -> Self {
        Self {
            store,
            hooks: Vec::new(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Observe every transition committed by slices of this factory.
    ///
    /// Hooks run before the write is committed and listeners are notified.
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Transition) + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Get the handle for slice `name`, initializing it if absent.
    ///
    /// If the store already holds state under `name`, `initial` is discarded
    /// without being evaluated.
    ///
    /// # Examples
    ///
    /// ```
    /// use slicestore::{DefineStore, Store};
    /// use serde_json::json;
    ///
    /// let define = DefineStore::new(Store::new());
    /// let counter = define.define("counter", json!({ "value": 0 }));
    /// counter.produce(|draft| draft["value"] = json!(1));
    ///
    /// let again = define.define("counter", json!({ "value": 0 }));
    /// assert_eq!(*again.get_state(), json!({ "value": 1 }));
    /// ```
    #[track_caller]
    pub fn define(&self, name: impl Into<String>, initial: impl Into<Initial>) -> Slice {
        let name: String = name.into();
        let slice = Slice::attach(&name, self.store.clone(), Arc::from(self.hooks.clone()));
        if !slice.is_initialized() {
            slice.set_state(initial.into().resolve());
        }
        slice
    }
}

impl Default for DefineStore {
    /// Factory bound to the ambient current store.
    fn default() -> Self {
        Self::new(StoreContext::current())
    }
}

impl fmt::Debug for DefineStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefineStore")
            .field("store", &self.store)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Wraps the base slice factory, typically to install transition hooks.
pub trait Enhancer {
    fn enhance(&self, base: DefineStore) -> Result<DefineStore>;
}

impl<F> Enhancer for F
where
    F: Fn(DefineStore) -> Result<DefineStore>,
{
    fn enhance(&self, base: DefineStore) -> Result<DefineStore> {
        self(base)
    }
}

/// Build a slice factory bound to `store` (default: the ambient current
/// store), optionally passed through `enhancer`.
///
/// An enhancer that rejects the base factory fails construction with
/// [`StoreError::Config`].
pub fn create_define_store(
    store: Option<Store>,
    enhancer: Option<&dyn Enhancer>,
) -> Result<DefineStore> {
    let base = DefineStore::new(store.unwrap_or_else(StoreContext::current));
    let Some(enhancer) = enhancer else {
        return Ok(base);
    };
    enhancer.enhance(base).map_err(|err| {
        tracing::warn!(error = %err, "enhancer rejected slice factory");
        match err {
            StoreError::Config(_) => err,
            other => StoreError::Config(other.to_string()),
        }
    })
}

/// Define a slice on the ambient current store.
#[track_caller]
pub fn define_store(name: impl Into<String>, initial: impl Into<Initial>) -> Slice {
    DefineStore::default().define(name, initial)
}

/// Handle to one named slice of a store.
#[derive(Clone)]
pub struct Slice {
    name: Arc<str>,
    store: Store,
    hooks: Arc<[TransitionHook]>,
}

impl Slice {
    pub(crate) fn attach(name: &str, store: Store, hooks: Arc<[TransitionHook]>) -> Self {
        Self {
            name: Arc::from(name),
            store,
            hooks,
        }
    }

    pub(crate) fn hooks(&self) -> Arc<[TransitionHook]> {
        Arc::clone(&self.hooks)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Whether the store holds state under this slice's name.
    pub fn is_initialized(&self) -> bool {
        self.store.get_state().contains(&self.name)
    }

    /// The slice's committed state, or `None` before initialization.
    pub fn try_state(&self) -> Option<Arc<Value>> {
        self.store.get_state().slice(&self.name)
    }

    /// The slice's committed state (`null` before initialization).
    pub fn get_state(&self) -> Arc<Value> {
        self.try_state().unwrap_or_else(|| Arc::new(Value::Null))
    }

    /// Decode the slice's state into `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> Result<T> {
        let state = self.get_state();
        <T as Deserialize>::deserialize(&*state).map_err(|source| StoreError::Codec {
            slice: self.name.to_string(),
            source,
        })
    }

    /// Apply an update to this slice only and commit it.
    ///
    /// Returns the committed state.
    #[track_caller]
    pub fn set_state(&self, update: impl Into<Update>) -> Arc<Value> {
        let previous = self.try_state();
        let next = update.into().apply(previous.as_deref());
        self.commit(previous, next, Location::caller(), false)
    }

    /// Edit a private copy of the current state and commit it.
    #[track_caller]
    pub fn produce<F>(&self, producer: F) -> Arc<Value>
    where
        F: FnOnce(&mut Value),
    {
        let previous = self.try_state();
        let next = produce(previous.as_deref().unwrap_or(&Value::Null), producer);
        self.commit(previous, next, Location::caller(), false)
    }

    /// Run an asynchronous producer and commit its result.
    ///
    /// The starting state is captured when this method is called, not when the
    /// future is first polled. Nothing serializes overlapping transitions on
    /// the same slice: each commits the draft it built from its own starting
    /// state, so the last one to finish overwrites the others. Use
    /// [`Slice::serialized`] when transitions must observe each other.
    #[track_caller]
    pub fn set_async_state<F, Fut>(&self, producer: F) -> impl Future<Output = Arc<Value>>
    where
        F: FnOnce(Value) -> Fut,
        Fut: Future<Output = Value>,
    {
        let location = Location::caller();
        let previous = self.try_state();
        let slice = self.clone();
        async move {
            let draft = previous.as_deref().cloned().unwrap_or(Value::Null);
            let next = producer(draft).await;
            slice.commit(previous, next, location, true)
        }
    }

    /// Handle whose async transitions on this slice run one at a time.
    pub fn serialized(&self) -> SerializedSlice {
        SerializedSlice::new(self.clone())
    }

    /// Attach named methods to this slice's registry entry.
    pub fn regist<I, K>(&self, methods: I)
    where
        I: IntoIterator<Item = (K, SliceMethod)>,
        K: Into<String>,
    {
        self.store.regist(&self.name, methods);
    }

    /// Invoke a method previously attached with [`Slice::regist`].
    ///
    /// The method runs against this handle, so its writes go through this
    /// handle's transition hooks.
    pub fn call(&self, method: &str, args: Value) -> Result<Value> {
        let (func, _) = self.store.lookup(&self.name, method)?;
        Ok(func(self, args))
    }

    /// Listen to every write on the store.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub(crate) fn commit(
        &self,
        previous: Option<Arc<Value>>,
        next: Value,
        location: &'static Location<'static>,
        is_async: bool,
    ) -> Arc<Value> {
        let next = Arc::new(next);
        let transition = Transition {
            slice: Arc::clone(&self.name),
            previous,
            next: Arc::clone(&next),
            location,
            is_async,
        };
        let config = self.store.config();
        if config.log_transitions {
            log_transition(&config.label, &transition);
        }
        for hook in self.hooks.iter() {
            hook(&transition);
        }
        self.store.commit(&self.name, Arc::clone(&next));
        next
    }
}

impl fmt::Debug for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slice")
            .field("name", &self.name)
            .field("state", &self.try_state())
            .finish()
    }
}

/// Wrap a closure as a [`SliceMethod`].
pub fn method<F>(func: F) -> SliceMethod
where
    F: Fn(&Slice, Value) -> Value + Send + Sync + 'static,
{
    Arc::new(func)
}
