use std::sync::{Arc, Mutex};

use chrono::Utc;
use cenner_client::data::{Collection, EntityStore};
use cenner_client::entities::{generate_id, Job, Listing, Urgency};
use cenner_client::identity::{CreatorStatus, Identity, Role, SubscriptionTier};
use cenner_client::session::SessionStore;
use cenner_client::storage::{FileStorage, MemoryStorage, Storage};

fn listing(id: &str, freelancer_name: &str) -> Listing {
    Listing {
        id: id.to_string(),
        title: "Logo design".to_string(),
        description: "A minimal logo".to_string(),
        category: "Design".to_string(),
        price: 120.0,
        delivery_time: "3 days".to_string(),
        freelancer_id: "u1".to_string(),
        freelancer_name: freelancer_name.to_string(),
        freelancer_avatar: "avatar.png".to_string(),
        rating: 4.8,
        reviews_count: 12,
        image_url: "listing.png".to_string(),
    }
}

fn job(id: &str) -> Job {
    Job {
        id: id.to_string(),
        title: "Build a landing page".to_string(),
        description: "One page, responsive".to_string(),
        category: "Development".to_string(),
        budget_range: "500-1000".to_string(),
        client_id: "c1".to_string(),
        client_name: "Acme".to_string(),
        client_avatar: "acme.png".to_string(),
        posted_at: Utc::now(),
        proposals_count: 0,
        urgency: Urgency::Medium,
    }
}

#[test]
fn listings_are_newest_first() {
    let store = EntityStore::new(Arc::new(MemoryStorage::new()));

    store.add_listing(listing("l1", "Alice"));
    store.add_listing(listing("l2", "Bob"));

    let listings = store.listings();
    assert_eq!(listings[0].id, "l2");
    assert_eq!(listings[1].id, "l1");
}

#[test]
fn jobs_are_newest_first() {
    let store = EntityStore::new(Arc::new(MemoryStorage::new()));

    store.add_job(job("j1"));
    store.add_job(job("j2"));

    let jobs = store.jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].id, "j2");
    assert_eq!(jobs[1].id, "j1");
}

#[test]
fn lookup_by_id() {
    let store = EntityStore::new(Arc::new(MemoryStorage::new()));
    let inserted = listing("l1", "Alice");
    store.add_listing(inserted.clone());

    assert_eq!(store.get_listing_by_id("l1").unwrap(), inserted);
    assert!(store.get_listing_by_id("nonexistent").is_none());
}

#[test]
fn collections_round_trip_through_storage() {
    let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());

    let first = EntityStore::new(storage.clone());
    first.add_listing(listing("l1", "Alice"));
    first.add_listing(listing("l2", "Bob"));
    first.add_job(job("j1"));

    let second = EntityStore::new(storage);
    assert_eq!(second.listings(), first.listings());
    assert_eq!(second.jobs(), first.jobs());
    assert!(second.blog_posts().is_empty());
}

#[test]
fn collections_round_trip_through_file_storage() {
    let dir = tempfile::tempdir().unwrap();

    let first = EntityStore::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
    first.add_listing(listing("l1", "Alice"));

    let second = EntityStore::new(Arc::new(FileStorage::new(dir.path()).unwrap()));
    assert_eq!(second.listings(), first.listings());
}

#[test]
fn corrupt_collection_hydrates_empty() {
    let storage = Arc::new(MemoryStorage::new());
    storage.write("listings", "[{broken").unwrap();

    let store = EntityStore::new(storage);
    assert!(store.listings().is_empty());
}

#[test]
fn watchers_are_notified_synchronously_in_order() {
    let store = EntityStore::new(Arc::new(MemoryStorage::new()));

    let events: Arc<Mutex<Vec<(&'static str, Collection)>>> = Arc::new(Mutex::new(Vec::new()));
    let first = Arc::clone(&events);
    store.watch(Box::new(move |collection| {
        first.lock().unwrap().push(("w1", collection))
    }));
    let second = Arc::clone(&events);
    store.watch(Box::new(move |collection| {
        second.lock().unwrap().push(("w2", collection))
    }));

    store.add_job(job("j1"));

    let events = events.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[("w1", Collection::Jobs), ("w2", Collection::Jobs)]
    );
}

#[test]
fn unwatch_stops_deliveries() {
    let store = EntityStore::new(Arc::new(MemoryStorage::new()));

    let count = Arc::new(Mutex::new(0u32));
    let count_cb = Arc::clone(&count);
    let handle = store.watch(Box::new(move |_| *count_cb.lock().unwrap() += 1));

    store.add_job(job("j1"));
    handle.unwatch();
    handle.unwatch();
    store.add_job(job("j2"));

    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn watcher_may_unwatch_another_during_notification() {
    let store = EntityStore::new(Arc::new(MemoryStorage::new()));

    let count = Arc::new(Mutex::new(0u32));
    let count_cb = Arc::clone(&count);
    let first = store.watch(Box::new(move |_| *count_cb.lock().unwrap() += 1));

    let first = Arc::new(Mutex::new(Some(first)));
    let first_cb = Arc::clone(&first);
    store.watch(Box::new(move |_| {
        if let Some(handle) = first_cb.lock().unwrap().take() {
            handle.unwatch();
        }
    }));

    store.add_job(job("j1"));
    store.add_job(job("j2"));

    // still registered for the delivery that removed it, gone for the next
    assert_eq!(*count.lock().unwrap(), 1);
}

#[test]
fn generated_ids_are_unique() {
    let first = generate_id("listing");
    let second = generate_id("listing");
    assert!(first.starts_with("listing_"));
    assert_ne!(first, second);
}

// Denormalized owner fields are creation-time snapshots: renaming the
// identity later does not rewrite existing entities.
#[test]
fn denormalized_owner_fields_stay_stale() {
    let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
    let session = SessionStore::new(storage.clone());
    let store = EntityStore::new(storage);

    let alice = Identity {
        id: "u1".to_string(),
        email: "alice@x.com".to_string(),
        display_name: "Alice".to_string(),
        avatar_url: None,
        role: Role::Freelancer,
        mobile: None,
        email_verified: true,
        mobile_verified: false,
        creator_status: CreatorStatus::Approved,
        subscription_tier: SubscriptionTier::Pro,
    };
    session.set_current(alice.clone()).unwrap();
    store.add_listing(listing("l1", &alice.display_name));

    let mut renamed = alice;
    renamed.display_name = "Alicia".to_string();
    session.set_current(renamed).unwrap();

    assert_eq!(store.get_listing_by_id("l1").unwrap().freelancer_name, "Alice");
}
