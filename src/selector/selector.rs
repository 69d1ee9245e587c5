use crate::selector::Identity;
use crate::state::StateTree;
use crate::store::{Store, Subscription};
use parking_lot::RwLock;
use std::sync::Arc;

type SelectFn<T> = Arc<dyn Fn(&StateTree) -> T + Send + Sync>;

/// A value derived from a store's state tree, kept up to date by a listener.
///
/// The selector runs once on creation and again after every store write.
/// `on_change` only runs when the new value is not [`Identity::identical`] to
/// the cached one. Dropping the selector unsubscribes its listener.
///
/// # Examples
///
/// ```
/// use slicestore::{Selector, Store};
/// use serde_json::json;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let store = Store::with_state([("counter", json!({ "value": 0 }))]);
/// let renders = Arc::new(AtomicUsize::new(0));
/// let renders_clone = renders.clone();
///
/// let value = Selector::new(
///     &store,
///     |state| state.get("counter").and_then(|c| c["value"].as_i64()),
///     move || {
///         renders_clone.fetch_add(1, Ordering::SeqCst);
///     },
/// );
///
/// store.set_state([("other", json!(true))]);
/// assert_eq!(renders.load(Ordering::SeqCst), 0);
///
/// store.set_state([("counter", json!({ "value": 1 }))]);
/// assert_eq!(renders.load(Ordering::SeqCst), 1);
/// assert_eq!(value.get(), Some(1));
/// ```
pub struct Selector<T> {
    store: Store,
    select: SelectFn<T>,
    cached: Arc<RwLock<T>>,
    subscription: Subscription,
}

impl<T> Selector<T>
where
    T: Identity + Clone + Send + Sync + 'static,
{
    /// Select from `store` now and re-select after every write.
    pub fn new<S, N>(store: &Store, select: S, on_change: N) -> Self
    where
        S: Fn(&StateTree) -> T + Send + Sync + 'static,
        N: Fn() + Send + Sync + 'static,
    {
        let select: SelectFn<T> = Arc::new(select);
        let cached = Arc::new(RwLock::new(select(&store.get_state())));

        let subscription = store.subscribe({
            let weak = store.downgrade();
            let select = Arc::clone(&select);
            let cached = Arc::clone(&cached);
            move || {
                let Some(store) = weak.upgrade() else {
                    return;
                };
                let next = select(&store.get_state());
                {
                    let mut last = cached.write();
                    if last.identical(&next) {
                        return;
                    }
                    *last = next;
                }
                on_change();
            }
        });

        Self {
            store: store.clone(),
            select,
            cached,
            subscription,
        }
    }

    /// The cached derived value.
    pub fn get(&self) -> T {
        self.cached.read().clone()
    }

    /// Borrow the cached value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.cached.read())
    }

    /// Run the selector against the live state without touching the cache.
    pub fn current(&self) -> T {
        (self.select)(&self.store.get_state())
    }

    /// Stop listening. Further calls do nothing.
    pub fn unsubscribe(&self) {
        self.subscription.unsubscribe();
    }

    /// Whether the selector still listens to its store.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }
}

impl<T> Drop for Selector<T> {
    fn drop(&mut self) {
        self.subscription.unsubscribe();
    }
}
