use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::state::{merge, StateTree};
use crate::store::define::Slice;
use crate::store::transition::TransitionHook;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

type Listener = Arc<dyn Fn() + Send + Sync>;

/// A named operation attached to a slice through [`Slice::regist`].
pub type SliceMethod = Arc<dyn Fn(&Slice, Value) -> Value + Send + Sync>;

#[derive(Default)]
struct Registration {
    handle: Option<Arc<[TransitionHook]>>,
    methods: BTreeMap<String, SliceMethod>,
}

struct Shared {
    state: RwLock<Arc<StateTree>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
    registry: Mutex<BTreeMap<String, Registration>>,
    gates: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    config: StoreConfig,
}

/// The state container: one state tree, its listeners and its slice registry.
///
/// `Store` is a shared handle; clones refer to the same container.
///
/// # Examples
///
/// ```
/// use slicestore::Store;
/// use serde_json::json;
///
/// let store = Store::new();
/// store.set_state([("a", json!(1))]);
/// assert_eq!(**store.get_state().get("a").unwrap(), json!(1));
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<Shared>,
}

impl Store {
    /// Create an empty store with the default config.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with `config`.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::from_tree(StateTree::new(), config)
    }

    /// Create a store seeded with the given slices.
    pub fn with_state<I, K>(initial: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self::from_tree(initial.into_iter().collect(), StoreConfig::default())
    }

    fn from_tree(tree: StateTree, config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(Shared {
                state: RwLock::new(Arc::new(tree)),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                registry: Mutex::new(BTreeMap::new()),
                gates: Mutex::new(HashMap::new()),
                config,
            }),
        }
    }

    /// The config this store was created with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Current snapshot of the state tree. Empty if nothing was written yet.
    pub fn get_state(&self) -> Arc<StateTree> {
        Arc::clone(&self.inner.state.read())
    }

    /// Merge each `(slice, value)` pair into its branch, then notify.
    ///
    /// Each branch becomes the shallow union of its current value and the new
    /// one when both are objects, and the new value otherwise. Slices not named
    /// in `partial` keep their exact state.
    pub fn set_state<I, K>(&self, partial: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        {
            let mut state = self.inner.state.write();
            let mut next = StateTree::clone(&state);
            for (name, value) in partial {
                let name = name.into();
                let merged = merge(next.get(&name).map(|current| &**current), value);
                next.insert(name, Arc::new(merged));
            }
            *state = Arc::new(next);
        }
        self.notify();
    }

    /// Replace one branch outright, then notify.
    pub(crate) fn commit(&self, name: &str, next: Arc<Value>) {
        {
            let mut state = self.inner.state.write();
            *state = Arc::new(state.with_branch(name.to_string(), next));
        }
        self.notify();
    }

    /// Register a listener called after every committed write.
    ///
    /// Listeners run in registration order with no arguments.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Number of live listener registrations.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    fn notify(&self) {
        // Point-in-time view: listeners may subscribe or unsubscribe mid-pass.
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    /// Shallow-merge methods into the registry entry of `slice`.
    pub fn regist<I, K>(&self, slice: &str, methods: I)
    where
        I: IntoIterator<Item = (K, SliceMethod)>,
        K: Into<String>,
    {
        let mut registry = self.inner.registry.lock();
        let entry = registry.entry(slice.to_string()).or_default();
        entry
            .methods
            .extend(methods.into_iter().map(|(name, method)| (name.into(), method)));
    }

    /// Names of the methods registered for `slice`.
    pub fn methods(&self, slice: &str) -> Vec<String> {
        self.inner
            .registry
            .lock()
            .get(slice)
            .map(|entry| entry.methods.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Invoke a registered method with `args`.
    ///
    /// The method receives the registered handle of `slice`, so its writes run
    /// that handle's transition hooks. Without a registered handle it gets a
    /// bare handle with no hooks; call through [`Slice::call`] to keep a
    /// factory's hooks in that case.
    pub fn call(&self, slice: &str, method: &str, args: Value) -> Result<Value> {
        let (func, hooks) = self.lookup(slice, method)?;
        let hooks = hooks.unwrap_or_else(|| Arc::from(Vec::new()));
        let handle = Slice::attach(slice, self.clone(), hooks);
        Ok(func(&handle, args))
    }

    /// The method registered as `method` on `slice`, with the hooks of the
    /// registered handle if there is one.
    pub(crate) fn lookup(
        &self,
        slice: &str,
        method: &str,
    ) -> Result<(SliceMethod, Option<Arc<[TransitionHook]>>)> {
        let registry = self.inner.registry.lock();
        let entry = registry.get(slice);
        let func = entry
            .and_then(|entry| entry.methods.get(method))
            .cloned()
            .ok_or_else(|| StoreError::UnknownMethod {
                slice: slice.to_string(),
                method: method.to_string(),
            })?;
        Ok((func, entry.and_then(|entry| entry.handle.clone())))
    }

    /// Explicitly register a slice handle under its name.
    ///
    /// Fails if a handle is already registered under that name; use
    /// [`Store::replace_registration`] to overwrite.
    pub fn register(&self, handle: &Slice) -> Result<()> {
        self.ensure_owned(handle)?;
        let mut registry = self.inner.registry.lock();
        let entry = registry.entry(handle.name().to_string()).or_default();
        if entry.handle.is_some() {
            tracing::warn!(
                store = %self.inner.config.label,
                slice = handle.name(),
                "slice already registered"
            );
            return Err(StoreError::DuplicateSlice {
                name: handle.name().to_string(),
            });
        }
        entry.handle = Some(handle.hooks());
        Ok(())
    }

    /// Register a slice handle, overwriting any previous registration.
    ///
    /// Returns whether a handle was replaced. Registered methods are kept.
    pub fn replace_registration(&self, handle: &Slice) -> Result<bool> {
        self.ensure_owned(handle)?;
        let mut registry = self.inner.registry.lock();
        let entry = registry.entry(handle.name().to_string()).or_default();
        Ok(entry.handle.replace(handle.hooks()).is_some())
    }

    /// The registered handle for `name`, if any.
    pub fn registered(&self, name: &str) -> Option<Slice> {
        let hooks = self.inner.registry.lock().get(name)?.handle.clone()?;
        Some(Slice::attach(name, self.clone(), hooks))
    }

    fn ensure_owned(&self, handle: &Slice) -> Result<()> {
        if handle.store().ptr_eq(self) {
            Ok(())
        } else {
            Err(StoreError::Config(format!(
                "slice '{}' belongs to a different store",
                handle.name()
            )))
        }
    }

    /// Gate shared by every serialized handle of `slice` on this store.
    pub(crate) fn gate(&self, slice: &str) -> Arc<tokio::sync::Mutex<()>> {
        Arc::clone(self.inner.gates.lock().entry(slice.to_string()).or_default())
    }

    /// Whether both handles refer to the same container.
    pub fn ptr_eq(&self, other: &Store) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Non-owning handle, used by listeners that need to read the store.
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("label", &self.inner.config.label)
            .field("slices", &self.get_state().len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Weak counterpart of [`Store`].
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<Shared>,
}

impl WeakStore {
    /// The store, if it is still alive.
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

/// Token for one listener registration.
///
/// Dropping the token leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Clone)]
pub struct Subscription {
    id: u64,
    store: Weak<Shared>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Remove this registration. Further calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(store) = self.store.upgrade() {
            let mut listeners = store.listeners.lock();
            if let Some(index) = listeners.iter().position(|(id, _)| *id == self.id) {
                listeners.remove(index);
            }
        }
    }

    /// Whether this registration is still live.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Create an empty store.
pub fn create_store() -> Store {
    Store::new()
}
