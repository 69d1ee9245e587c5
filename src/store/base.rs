use crate::error::{Result, StoreError};
use crate::store::define::{DefineStore, Slice};
use crate::store::store::{Store, Subscription};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::panic::Location;

/// A slice described by a type: its name, state type and initial state.
///
/// # Examples
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use slicestore::{Store, StoreBase, TypedSlice};
///
/// #[derive(Serialize, Deserialize)]
/// struct Counter {
///     value: i64,
/// }
///
/// struct CounterStore;
///
/// impl StoreBase for CounterStore {
///     const NAME: &'static str = "counter";
///     type State = Counter;
///
///     fn initial() -> Counter {
///         Counter { value: 0 }
///     }
/// }
///
/// let store = Store::new();
/// let counter = TypedSlice::<CounterStore>::new(&store).unwrap();
/// counter.update(|state| state.value += 1).unwrap();
/// assert_eq!(counter.state().unwrap().value, 1);
/// ```
pub trait StoreBase {
    const NAME: &'static str;
    type State: Serialize + DeserializeOwned;

    fn initial() -> Self::State;
}

/// Typed handle for a [`StoreBase`] slice.
///
/// Construction only initializes the slice; it does not register the handle.
/// Call [`Store::register`] with [`TypedSlice::slice`] for that.
pub struct TypedSlice<M: StoreBase> {
    slice: Slice,
    _model: PhantomData<fn() -> M>,
}

impl<M: StoreBase> TypedSlice<M> {
    /// Define the slice on `store` with a plain factory.
    #[track_caller]
    pub fn new(store: &Store) -> Result<Self> {
        Self::with_factory(&DefineStore::new(store.clone()))
    }

    /// Define the slice through `factory`, sharing its transition hooks.
    #[track_caller]
    pub fn with_factory(factory: &DefineStore) -> Result<Self> {
        let initial = if factory.store().get_state().contains(M::NAME) {
            Value::Null
        } else {
            Self::encode(&M::initial())?
        };
        Ok(Self {
            slice: factory.define(M::NAME, initial),
            _model: PhantomData,
        })
    }

    pub fn name(&self) -> &'static str {
        M::NAME
    }

    pub fn slice(&self) -> &Slice {
        &self.slice
    }

    /// Decode the committed state.
    pub fn state(&self) -> Result<M::State> {
        self.slice.get_as()
    }

    /// Shallow-merge the serialized `state` into the slice.
    #[track_caller]
    pub fn set_state(&self, state: &M::State) -> Result<()> {
        self.slice.set_state(Self::encode(state)?);
        Ok(())
    }

    /// Edit a decoded copy of the state and commit it in full.
    #[track_caller]
    pub fn update<F>(&self, f: F) -> Result<M::State>
    where
        F: FnOnce(&mut M::State),
    {
        let previous = self.slice.try_state();
        let mut draft = self.state()?;
        f(&mut draft);
        let next = Self::encode(&draft)?;
        self.slice.commit(previous, next, Location::caller(), false);
        Ok(draft)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.slice.subscribe(listener)
    }

    fn encode(state: &M::State) -> Result<Value> {
        serde_json::to_value(state).map_err(|source| StoreError::Codec {
            slice: M::NAME.to_string(),
            source,
        })
    }
}

impl<M: StoreBase> Clone for TypedSlice<M> {
    fn clone(&self) -> Self {
        Self {
            slice: self.slice.clone(),
            _model: PhantomData,
        }
    }
}
