use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable snapshot of every slice held by a store.
///
/// Branches are reference counted, so a write only allocates the branch it
/// changes; every other branch is shared with the previous snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateTree {
    slices: BTreeMap<String, Arc<Value>>,
}

impl StateTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a slice's state.
    pub fn get(&self, name: &str) -> Option<&Arc<Value>> {
        self.slices.get(name)
    }

    /// Shared handle to a slice's state, identity preserved.
    pub fn slice(&self, name: &str) -> Option<Arc<Value>> {
        self.slices.get(name).cloned()
    }

    /// Whether a slice is present under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.slices.contains_key(name)
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether the tree holds no slices.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Slice names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    /// Slices with their state, in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Value>)> {
        self.slices.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Deep copy of the whole tree as a JSON object.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .slices
            .iter()
            .map(|(name, value)| (name.clone(), Value::clone(value)))
            .collect();
        Value::Object(map)
    }

    pub(crate) fn insert(&mut self, name: String, value: Arc<Value>) {
        self.slices.insert(name, value);
    }

    /// New snapshot with one branch swapped.
    pub(crate) fn with_branch(&self, name: String, value: Arc<Value>) -> Self {
        let mut slices = self.slices.clone();
        slices.insert(name, value);
        Self { slices }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for StateTree {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            slices: iter
                .into_iter()
                .map(|(name, value)| (name.into(), Arc::new(value)))
                .collect(),
        }
    }
}
