use std::sync::{Arc, Mutex};

use cenner_client::error::Error;
use cenner_client::identity::{CreatorStatus, Identity, Role, SubscriptionTier};
use cenner_client::session::SessionStore;
use cenner_client::storage::{MemoryStorage, Storage};

fn identity(id: &str, email: &str) -> Identity {
    Identity {
        id: id.to_string(),
        email: email.to_string(),
        display_name: email.split('@').next().unwrap().to_string(),
        avatar_url: None,
        role: Role::User,
        mobile: None,
        email_verified: false,
        mobile_verified: false,
        creator_status: CreatorStatus::None,
        subscription_tier: SubscriptionTier::Free,
    }
}

#[test]
fn last_set_identity_wins() {
    let store = SessionStore::new(Arc::new(MemoryStorage::new()));

    store.set_current(identity("a", "a@x.com")).unwrap();
    store.set_current(identity("b", "b@x.com")).unwrap();

    let current = store.get_current().unwrap();
    assert_eq!(current.id, "b");
    assert_eq!(current.email, "b@x.com");
}

#[test]
fn subscribe_delivers_current_state_immediately() {
    let store = SessionStore::new(Arc::new(MemoryStorage::new()));
    store.set_current(identity("a", "a@x.com")).unwrap();

    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_cb = Arc::clone(&seen);
    store.subscribe(Box::new(move |current| {
        seen_cb
            .lock()
            .unwrap()
            .push(current.map(|identity| identity.id.clone()));
    }));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.as_slice(), &[Some("a".to_string())]);
}

#[test]
fn subscribers_fire_in_registration_order() {
    let store = SessionStore::new(Arc::new(MemoryStorage::new()));

    let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&order);
    store.subscribe(Box::new(move |_| first.lock().unwrap().push("s1")));
    let second = Arc::clone(&order);
    store.subscribe(Box::new(move |_| second.lock().unwrap().push("s2")));

    order.lock().unwrap().clear();
    store.set_current(identity("a", "a@x.com")).unwrap();

    assert_eq!(order.lock().unwrap().as_slice(), &["s1", "s2"]);
}

#[test]
fn clear_signs_out_and_notifies() {
    let store = SessionStore::new(Arc::new(MemoryStorage::new()));
    store.set_current(identity("a", "a@x.com")).unwrap();

    let last: Arc<Mutex<Option<Option<String>>>> = Arc::new(Mutex::new(None));
    let last_cb = Arc::clone(&last);
    store.subscribe(Box::new(move |current| {
        *last_cb.lock().unwrap() = Some(current.map(|identity| identity.id.clone()));
    }));

    store.clear().unwrap();

    assert!(store.get_current().is_none());
    assert_eq!(*last.lock().unwrap(), Some(None));
}

#[test]
fn unsubscribe_is_idempotent() {
    let store = SessionStore::new(Arc::new(MemoryStorage::new()));

    let count = Arc::new(Mutex::new(0u32));
    let count_cb = Arc::clone(&count);
    let subscription = store.subscribe(Box::new(move |_| *count_cb.lock().unwrap() += 1));
    assert_eq!(*count.lock().unwrap(), 1); // initial delivery

    subscription.unsubscribe();
    subscription.unsubscribe();

    store.set_current(identity("a", "a@x.com")).unwrap();
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn subscriber_may_unsubscribe_another_during_notification() {
    let store = SessionStore::new(Arc::new(MemoryStorage::new()));

    let count = Arc::new(Mutex::new(0u32));
    let count_cb = Arc::clone(&count);
    let first = store.subscribe(Box::new(move |_| *count_cb.lock().unwrap() += 1));

    // Deregisters the first subscriber from inside a delivery. Skips the
    // initial registration callback, where no session exists yet.
    let first = Arc::new(Mutex::new(Some(first)));
    let first_cb = Arc::clone(&first);
    store.subscribe(Box::new(move |current| {
        if current.is_some() {
            if let Some(subscription) = first_cb.lock().unwrap().take() {
                subscription.unsubscribe();
            }
        }
    }));

    store.set_current(identity("a", "a@x.com")).unwrap();
    store.set_current(identity("b", "b@x.com")).unwrap();

    // initial delivery + the mutation it was still registered for
    assert_eq!(*count.lock().unwrap(), 2);
}

struct FailingStorage;

impl Storage for FailingStorage {
    fn read(&self, _key: &str) -> Option<String> {
        None
    }

    fn write(&self, _key: &str, _value: &str) -> Result<(), Error> {
        Err(Error::storage("disk full"))
    }

    fn remove(&self, _key: &str) -> Result<(), Error> {
        Err(Error::storage("disk full"))
    }
}

#[test]
fn storage_write_failure_surfaces_as_a_storage_error() {
    let store = SessionStore::new(Arc::new(FailingStorage));

    let result = store.set_current(identity("a", "a@x.com"));
    assert!(matches!(result, Err(Error::Storage(_))));
}

#[test]
fn session_survives_a_new_store_over_the_same_storage() {
    let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());

    let first = SessionStore::new(storage.clone());
    first.set_current(identity("a", "a@x.com")).unwrap();

    let second = SessionStore::new(storage);
    assert_eq!(second.get_current().unwrap().id, "a");
}

#[test]
fn corrupt_session_record_reads_as_signed_out() {
    let storage = Arc::new(MemoryStorage::new());
    storage.write("session", "{definitely not json").unwrap();

    let store = SessionStore::new(storage);
    assert!(store.get_current().is_none());
}
