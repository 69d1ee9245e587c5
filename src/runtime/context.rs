use crate::config::StoreConfig;
use crate::selector::{Identity, Selector};
use crate::state::StateTree;
use crate::store::Store;
use std::cell::RefCell;
use std::sync::OnceLock;

// Thread-local stack of provided stores
thread_local! {
    static STORE_STACK: RefCell<Vec<Store>> = const { RefCell::new(Vec::new()) };
}

/// Resolution of "the current store" for code that is not handed one.
///
/// Resolution order: the innermost store passed to [`StoreContext::provide`]
/// on this thread, then the process-wide default store.
///
/// # Examples
///
/// ```
/// use slicestore::{use_store, Store, StoreContext};
///
/// let store = Store::new();
/// StoreContext::provide(store.clone(), || {
///     assert!(use_store().ptr_eq(&store));
/// });
/// assert!(use_store().ptr_eq(&StoreContext::global()));
/// ```
pub struct StoreContext;

impl StoreContext {
    /// The process-wide default store, created on first use.
    pub fn global() -> Store {
        static DEFAULT: OnceLock<Store> = OnceLock::new();
        DEFAULT
            .get_or_init(|| Store::with_config(StoreConfig::labeled("global")))
            .clone()
    }

    /// The innermost provided store, or the global default.
    pub fn current() -> Store {
        STORE_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run `f` with `store` as the current store.
    ///
    /// The previous current store is restored when `f` returns or panics.
    /// The scope is per thread and does not follow a future across `.await`
    /// points on other threads.
    pub fn provide<F, R>(store: Store, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _scope = ProvidedScope::enter(store);
        f()
    }

    /// Number of stores currently provided on this thread.
    pub fn depth() -> usize {
        STORE_STACK.with(|stack| stack.borrow().len())
    }
}

/// Pops the provided store when dropped, including during unwinding.
struct ProvidedScope;

impl ProvidedScope {
    fn enter(store: Store) -> Self {
        STORE_STACK.with(|stack| stack.borrow_mut().push(store));
        ProvidedScope
    }
}

impl Drop for ProvidedScope {
    fn drop(&mut self) {
        STORE_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The current store.
pub fn use_store() -> Store {
    StoreContext::current()
}

/// Subscribe `selector` to the current store.
///
/// `on_change` runs whenever the selected value stops being identical to the
/// cached one. The subscription ends when the returned [`Selector`] is dropped.
pub fn use_selector<T, S, N>(selector: S, on_change: N) -> Selector<T>
where
    T: Identity + Clone + Send + Sync + 'static,
    S: Fn(&StateTree) -> T + Send + Sync + 'static,
    N: Fn() + Send + Sync + 'static,
{
    Selector::new(&StoreContext::current(), selector, on_change)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn falls_back_to_global() {
        assert_eq!(StoreContext::depth(), 0);
        assert!(StoreContext::current().ptr_eq(&StoreContext::global()));
    }

    #[test]
    fn nested_scopes_resolve_innermost() {
        let outer = Store::new();
        let inner = Store::new();

        StoreContext::provide(outer.clone(), || {
            assert!(use_store().ptr_eq(&outer));
            StoreContext::provide(inner.clone(), || {
                assert!(use_store().ptr_eq(&inner));
                assert_eq!(StoreContext::depth(), 2);
            });
            assert!(use_store().ptr_eq(&outer));
        });
        assert_eq!(StoreContext::depth(), 0);
    }

    #[test]
    fn scope_is_restored_after_panic() {
        let store = Store::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            StoreContext::provide(store.clone(), || panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(StoreContext::depth(), 0);
    }

    #[test]
    fn inner_panic_restores_outer_scope() {
        let outer = Store::new();
        StoreContext::provide(outer.clone(), || {
            let result = std::panic::catch_unwind(|| {
                StoreContext::provide(Store::new(), || panic!("boom"));
            });
            assert!(result.is_err());
            assert_eq!(StoreContext::depth(), 1);
            assert!(use_store().ptr_eq(&outer));
        });
    }

    #[test]
    fn use_selector_reads_provided_store() {
        let store = Store::with_state([("a", json!(1))]);
        let selected = StoreContext::provide(store.clone(), || {
            use_selector(|state| state.slice("a"), || {})
        });
        assert_eq!(selected.get(), Some(std::sync::Arc::new(json!(1))));
        assert_eq!(store.listener_count(), 1);
        drop(selected);
        assert_eq!(store.listener_count(), 0);
    }
}
