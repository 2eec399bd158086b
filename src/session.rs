//! Session store: the single holder of the current [`Identity`].
//!
//! Zero or one identity is current at any time. The store is the only
//! component that mutates the persisted session record; every mutation is
//! written through to durable storage and then delivered synchronously to
//! subscribers in registration order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::identity::Identity;
use crate::storage::{self, Storage, SESSION_KEY};

/// Callback invoked with the current identity (or `None`) on registration
/// and after every session change.
pub type SessionCallback = Box<dyn Fn(Option<&Identity>) + Send + Sync>;

type SharedCallback = Arc<dyn Fn(Option<&Identity>) + Send + Sync>;

struct State {
    hydrated: bool,
    current: Option<Identity>,
}

/// Holds the current identity, persists it, and notifies subscribers.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
    state: Mutex<State>,
    subscribers: Arc<Mutex<Vec<(u64, SharedCallback)>>>,
    next_subscriber_id: AtomicU64,
}

/// Handle returned by [`SessionStore::subscribe`]; deregisters the callback.
pub struct SessionSubscription {
    id: u64,
    subscribers: Arc<Mutex<Vec<(u64, SharedCallback)>>>,
}

impl SessionSubscription {
    /// Remove the callback. Calling this more than once is a no-op.
    pub fn unsubscribe(&self) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|(id, _)| *id != self.id);
    }
}

impl SessionStore {
    /// Create a store over the given storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            state: Mutex::new(State {
                hydrated: false,
                current: None,
            }),
            subscribers: Arc::new(Mutex::new(Vec::new())),
            next_subscriber_id: AtomicU64::new(0),
        }
    }

    /// The current identity, or `None` when signed out.
    ///
    /// Hydrates lazily from durable storage; an absent or corrupt record
    /// reads as `None` rather than an error.
    pub fn get_current(&self) -> Option<Identity> {
        let mut state = self.state.lock().unwrap();
        if !state.hydrated {
            state.current = storage::read_json(self.storage.as_ref(), SESSION_KEY);
            state.hydrated = true;
        }
        state.current.clone()
    }

    /// Replace the current identity, persist it, and notify subscribers.
    pub fn set_current(&self, identity: Identity) -> Result<(), Error> {
        storage::write_json(self.storage.as_ref(), SESSION_KEY, &identity)?;
        {
            let mut state = self.state.lock().unwrap();
            state.current = Some(identity.clone());
            state.hydrated = true;
        }
        self.notify(Some(&identity));
        Ok(())
    }

    /// Clear the session, remove the persisted record, and notify subscribers.
    pub fn clear(&self) -> Result<(), Error> {
        self.storage.remove(SESSION_KEY)?;
        {
            let mut state = self.state.lock().unwrap();
            state.current = None;
            state.hydrated = true;
        }
        self.notify(None);
        Ok(())
    }

    /// Register `callback` for session changes.
    ///
    /// The callback is invoked synchronously with the current identity before
    /// this call returns, and again after every subsequent change, in
    /// registration order.
    pub fn subscribe(&self, callback: SessionCallback) -> SessionSubscription {
        let callback: SharedCallback = Arc::from(callback);
        let current = self.get_current();
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);

        self.subscribers.lock().unwrap().push((id, callback.clone()));
        callback(current.as_ref());

        SessionSubscription {
            id,
            subscribers: Arc::clone(&self.subscribers),
        }
    }

    // Delivery runs over a snapshot taken under the lock, so callbacks may
    // subscribe or unsubscribe while being notified. A callback removed
    // mid-delivery still receives the in-flight notification.
    fn notify(&self, current: Option<&Identity>) {
        let snapshot: Vec<SharedCallback> = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in snapshot {
            callback(current);
        }
    }
}
