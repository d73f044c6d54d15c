//! Per-client session state
//!
//! Each client identity maps to exactly one [`Session`] for the lifetime of the
//! process. Sessions hold arbitrary JSON values keyed by string.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use serde_json::Value;

#[derive(Debug)]
pub struct Session {
    identity: String,
    values: RwLock<HashMap<String, Value>>,
}

impl Session {
    fn new(identity: String) -> Self {
        Self {
            identity,
            values: RwLock::new(HashMap::new()),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = self
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, identity: &str) -> Arc<Session> {
        if let Some(session) = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identity)
        {
            return Arc::clone(session);
        }

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // another writer may have won the race between the two locks
        let session = sessions.entry(identity.to_string()).or_insert_with(|| {
            tracing::debug!(identity = %identity, "session created");
            Arc::new(Session::new(identity.to_string()))
        });
        Arc::clone(session)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use serde_json::json;

    use super::SessionStore;

    #[test]
    fn get_or_create_returns_same_instance_per_identity() {
        let store = SessionStore::new();

        let first = store.get_or_create("client-A");
        let second = store.get_or_create("client-A");
        let other = store.get_or_create("client-B");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn sessions_have_independent_values() {
        let store = SessionStore::new();
        let a = store.get_or_create("client-A");
        a.set("color", json!("green"));

        let b = store.get_or_create("client-B");
        assert_eq!(a.get("color"), Some(json!("green")));
        assert_eq!(b.get("color"), None);
        assert!(b.keys().is_empty());
        assert_eq!(b.identity(), "client-B");
    }

    #[test]
    fn set_overwrites_existing_value() {
        let store = SessionStore::new();
        let session = store.get_or_create("client-A");
        session.set("count", json!(1));
        session.set("count", json!(2));

        assert_eq!(session.get("count"), Some(json!(2)));
        assert_eq!(session.keys(), vec!["count".to_string()]);
    }

    #[test]
    fn concurrent_sets_with_distinct_keys_all_persist() {
        let store = Arc::new(SessionStore::new());

        let workers = (0..16)
            .map(|worker| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let session = store.get_or_create("shared");
                    for item in 0..50 {
                        session.set(format!("k-{worker}-{item}"), json!(item));
                    }
                })
            })
            .collect::<Vec<_>>();

        for worker in workers {
            worker.join().expect("worker thread");
        }

        assert_eq!(store.len(), 1);
        let session = store.get_or_create("shared");
        assert_eq!(session.keys().len(), 16 * 50);
        assert_eq!(session.get("k-15-49"), Some(json!(49)));
    }

    #[test]
    fn new_store_is_empty() {
        assert!(SessionStore::new().is_empty());
    }
}
