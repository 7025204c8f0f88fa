//! Process-wide shared state.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{Map, Value};

/// The single mutable key/value mapping visible to every event handler
/// and serialized into every rendered document.
///
/// Individual operations are atomic per key. Sequences of operations are
/// not: concurrent dispatches touching the same keys interleave freely.
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<DashMap<String, Value>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(initial: Map<String, Value>) -> Self {
        let state = Self::new();
        for (key, value) in initial {
            state.inner.insert(key, value);
        }
        state
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.get(key).map(|entry| entry.value().clone())
    }

    /// Insert a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.remove(key).map(|(_, value)| value)
    }

    /// Replace a key's value with `f(current)` while holding its shard lock.
    pub fn update<F>(&self, key: impl Into<String>, f: F) -> Value
    where
        F: FnOnce(Option<&Value>) -> Value,
    {
        match self.inner.entry(key.into()) {
            Entry::Occupied(mut entry) => {
                let next = f(Some(entry.get()));
                entry.insert(next.clone());
                next
            }
            Entry::Vacant(entry) => {
                let next = f(None);
                entry.insert(next.clone());
                next
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Copy of every entry. Not atomic across shards.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.inner
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.snapshot()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_remove() {
        let state = SharedState::new();
        assert!(state.is_empty());
        assert_eq!(state.set("count", json!(1)), None);
        assert_eq!(state.set("count", json!(2)), Some(json!(1)));
        assert_eq!(state.get("count"), Some(json!(2)));
        assert_eq!(state.remove("count"), Some(json!(2)));
        assert!(state.get("count").is_none());
    }

    #[test]
    fn test_update_increments() {
        let state = SharedState::new();
        for _ in 0..3 {
            state.update("clicks", |v| json!(v.and_then(Value::as_i64).unwrap_or(0) + 1));
        }
        assert_eq!(state.get("clicks"), Some(json!(3)));
    }

    #[test]
    fn test_clones_share_storage() {
        let a = SharedState::from_map(Map::new());
        let b = a.clone();
        a.set("theme", json!("dark"));
        assert_eq!(b.get("theme"), Some(json!("dark")));
    }

    #[test]
    fn test_snapshot_serialization() {
        let state = SharedState::new();
        state.set("b", json!(2));
        state.set("a", json!("x"));
        let parsed: Value = serde_json::from_str(&state.to_json()).unwrap();
        assert_eq!(parsed, json!({ "a": "x", "b": 2 }));
    }
}
