use serde_json::Value;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Callback observing every committed slice transition of a factory.
pub type TransitionHook = Arc<dyn Fn(&Transition) + Send + Sync>;

/// One slice write, as seen by logging and transition hooks.
#[derive(Clone)]
pub struct Transition {
    pub slice: Arc<str>,
    /// `None` when the write initialized the slice.
    pub previous: Option<Arc<Value>>,
    pub next: Arc<Value>,
    /// Call site that requested the write.
    pub location: &'static Location<'static>,
    pub is_async: bool,
}

impl Transition {
    /// `slice/file:line` label of the transition.
    pub fn action(&self) -> String {
        format!(
            "{}/{}:{}",
            self.slice,
            self.location.file(),
            self.location.line()
        )
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("action", &self.action())
            .field("previous", &self.previous)
            .field("next", &self.next)
            .field("is_async", &self.is_async)
            .finish()
    }
}

pub(crate) fn log_transition(label: &str, transition: &Transition) {
    let previous = transition
        .previous
        .as_deref()
        .map(Value::to_string)
        .unwrap_or_else(|| "<absent>".to_string());
    tracing::debug!(
        target: "slicestore::transition",
        store = label,
        action = %transition.action(),
        is_async = transition.is_async,
        previous = %previous,
        next = %transition.next,
        "state transition"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_names_slice_and_call_site() {
        let transition = Transition {
            slice: Arc::from("counter"),
            previous: None,
            next: Arc::new(json!(0)),
            location: Location::caller(),
            is_async: false,
        };
        let action = transition.action();
        assert!(action.starts_with("counter/"));
        assert!(action.contains(".rs:"));
    }
}
