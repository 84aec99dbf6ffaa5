use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::errors::{DeskError, DeskResult};

/// A value that carries its own store key (the product id everywhere on this
/// desk).
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Callback surface a store notifies on every accepted message.
///
/// Only `on_add` is exercised by the desk chains; `on_remove` and `on_update`
/// exist for collaborators that need them and default to doing nothing.
pub trait Listener<V>: Send + Sync {
    fn on_add(&self, v: &V);

    /// Not exercised by the desk chains.
    fn on_remove(&self, _v: &V) {}

    /// Not exercised by the desk chains.
    fn on_update(&self, _v: &V) {}
}

/// A keyed pub-sub store. `on_message` is the only mutation path: it upserts
/// by the key embedded in the value, then synchronously notifies every
/// listener in registration order before returning. Each store serializes its
/// updates — at most one `on_message` is in flight at a time, and its
/// notification completes before the next update is admitted.
///
/// Chains are acyclic: a listener may `get` from any store, including the one
/// notifying it, but must not call `on_message` back into that store.
pub trait Store<V: Keyed>: Send + Sync {
    /// Look up the latest value for a key. Misses are the caller's problem;
    /// there is no implicit default.
    fn get(&self, key: &str) -> DeskResult<V>;

    /// Upsert + notify. Invoked by inbound adapters and upstream listeners,
    /// never by anything else.
    fn on_message(&self, v: V);

    fn add_listener(&self, listener: Arc<dyn Listener<V>>);

    fn listeners(&self) -> Vec<Arc<dyn Listener<V>>>;
}

/// Plain map-backed store. Reference prices, quotes and execution orders all
/// live in one of these; the order book store layers its own `on_message` on
/// the same shape.
pub struct KeyedStore<V> {
    name: &'static str,
    // Serialization point: held across upsert + notify, so listener work for
    // one update finishes before the next is admitted.
    gate: Mutex<()>,
    entries: Mutex<HashMap<String, V>>,
    listeners: RwLock<Vec<Arc<dyn Listener<V>>>>,
}

impl<V> KeyedStore<V> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            gate: Mutex::new(()),
            entries: Mutex::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<V: Keyed + Clone + Send + Sync> Store<V> for KeyedStore<V> {
    fn get(&self, key: &str) -> DeskResult<V> {
        self.entries
            .lock()
            .get(key)
            .cloned()
            .ok_or_else(|| DeskError::NotFound { store: self.name, key: key.to_string() })
    }

    fn on_message(&self, v: V) {
        let _gate = self.gate.lock();
        let key = v.key().to_string();
        self.entries.lock().insert(key.clone(), v.clone());
        trace!(store = self.name, key = %key, "message accepted");
        for listener in self.listeners.read().iter() {
            listener.on_add(&v);
        }
    }

    fn add_listener(&self, listener: Arc<dyn Listener<V>>) {
        self.listeners.write().push(listener);
    }

    fn listeners(&self) -> Vec<Arc<dyn Listener<V>>> {
        self.listeners.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Tagged {
        id: String,
        n: i64,
    }

    impl Keyed for Tagged {
        fn key(&self) -> &str {
            &self.id
        }
    }

    struct Recorder {
        label: &'static str,
        seen: Mutex<Vec<(&'static str, i64)>>,
    }

    impl Recorder {
        fn new(label: &'static str) -> Arc<Self> {
            Arc::new(Self { label, seen: Mutex::new(Vec::new()) })
        }
    }

    impl Listener<Tagged> for Recorder {
        fn on_add(&self, v: &Tagged) {
            self.seen.lock().push((self.label, v.n));
        }
    }

    #[test]
    fn get_misses_are_not_found() {
        let store: KeyedStore<Tagged> = KeyedStore::new("test");
        assert_eq!(
            store.get("91282CFX4"),
            Err(DeskError::NotFound { store: "test", key: "91282CFX4".into() })
        );
    }

    #[test]
    fn on_message_upserts_last_write_wins() {
        let store = KeyedStore::new("test");
        store.on_message(Tagged { id: "a".into(), n: 1 });
        store.on_message(Tagged { id: "a".into(), n: 2 });
        assert_eq!(store.get("a").unwrap().n, 2);
    }

    #[test]
    fn listeners_notified_in_registration_order() {
        let store = KeyedStore::new("test");
        let first = Recorder::new("first");
        let second = Recorder::new("second");
        store.add_listener(first.clone());
        store.add_listener(second.clone());

        // shared log proves relative order across listeners
        store.on_message(Tagged { id: "a".into(), n: 7 });

        assert_eq!(first.seen.lock().as_slice(), &[("first", 7)]);
        assert_eq!(second.seen.lock().as_slice(), &[("second", 7)]);
        assert_eq!(store.listeners().len(), 2);
    }

    #[test]
    fn listener_sees_value_already_stored() {
        struct ReadBack {
            store: Arc<KeyedStore<Tagged>>,
            ok: Mutex<bool>,
        }
        impl Listener<Tagged> for ReadBack {
            fn on_add(&self, v: &Tagged) {
                // the upsert must land before listeners run
                *self.ok.lock() = self.store.get(v.key()).ok().as_ref() == Some(v);
            }
        }

        let store = Arc::new(KeyedStore::new("test"));
        let probe = Arc::new(ReadBack { store: store.clone(), ok: Mutex::new(false) });
        store.add_listener(probe.clone());
        store.on_message(Tagged { id: "a".into(), n: 3 });
        assert!(*probe.ok.lock());
    }
}
