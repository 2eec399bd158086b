//! Entity store: the persisted, reactive collections behind the
//! marketplace, jobs board, and blog pages.
//!
//! Collections are independent of identity. Every mutation prepends
//! (newest first), persists the whole collection, then notifies watchers
//! synchronously. There is no update or delete operation; that is a
//! modeled limitation of the product, not an oversight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::entities::{BlogPost, Job, Listing};
use crate::storage::{self, Storage, JOBS_KEY, LISTINGS_KEY, POSTS_KEY};

/// Which collection a change applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Listings,
    Jobs,
    Posts,
}

/// Callback invoked synchronously after a collection changes.
pub type WatchCallback = Box<dyn Fn(Collection) + Send + Sync>;

type SharedWatcher = Arc<dyn Fn(Collection) + Send + Sync>;

/// In-memory, persisted, reactive store for the three entity collections.
pub struct EntityStore {
    storage: Arc<dyn Storage>,
    listings: Mutex<Vec<Listing>>,
    jobs: Mutex<Vec<Job>>,
    posts: Mutex<Vec<BlogPost>>,
    watchers: Arc<Mutex<Vec<(u64, SharedWatcher)>>>,
    next_watcher_id: AtomicU64,
}

/// Handle returned by [`EntityStore::watch`]; deregisters the callback.
pub struct WatchHandle {
    id: u64,
    watchers: Arc<Mutex<Vec<(u64, SharedWatcher)>>>,
}

impl WatchHandle {
    /// Remove the callback. Calling this more than once is a no-op.
    pub fn unwatch(&self) {
        self.watchers.lock().unwrap().retain(|(id, _)| *id != self.id);
    }
}

impl EntityStore {
    /// Hydrate the collections from durable storage.
    ///
    /// An absent or unparsable collection starts empty; sample data is
    /// never fabricated.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        let listings =
            storage::read_json(storage.as_ref(), LISTINGS_KEY).unwrap_or_default();
        let jobs = storage::read_json(storage.as_ref(), JOBS_KEY).unwrap_or_default();
        let posts = storage::read_json(storage.as_ref(), POSTS_KEY).unwrap_or_default();

        Self {
            storage,
            listings: Mutex::new(listings),
            jobs: Mutex::new(jobs),
            posts: Mutex::new(posts),
            watchers: Arc::new(Mutex::new(Vec::new())),
            next_watcher_id: AtomicU64::new(0),
        }
    }

    /// Prepend a listing, persist, and notify watchers.
    pub fn add_listing(&self, listing: Listing) {
        {
            let mut listings = self.listings.lock().unwrap();
            listings.insert(0, listing);
            self.persist(LISTINGS_KEY, &*listings);
        }
        self.notify(Collection::Listings);
    }

    /// Prepend a job, persist, and notify watchers.
    pub fn add_job(&self, job: Job) {
        {
            let mut jobs = self.jobs.lock().unwrap();
            jobs.insert(0, job);
            self.persist(JOBS_KEY, &*jobs);
        }
        self.notify(Collection::Jobs);
    }

    /// Prepend a blog post, persist, and notify watchers.
    pub fn add_blog_post(&self, post: BlogPost) {
        {
            let mut posts = self.posts.lock().unwrap();
            posts.insert(0, post);
            self.persist(POSTS_KEY, &*posts);
        }
        self.notify(Collection::Posts);
    }

    /// Snapshot of the listings collection, newest first.
    pub fn listings(&self) -> Vec<Listing> {
        self.listings.lock().unwrap().clone()
    }

    /// Snapshot of the jobs collection, newest first.
    pub fn jobs(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().clone()
    }

    /// Snapshot of the blog posts collection, newest first.
    pub fn blog_posts(&self) -> Vec<BlogPost> {
        self.posts.lock().unwrap().clone()
    }

    /// Look up a listing by id. Linear scan; collections are demo-scale.
    pub fn get_listing_by_id(&self, id: &str) -> Option<Listing> {
        self.listings
            .lock()
            .unwrap()
            .iter()
            .find(|listing| listing.id == id)
            .cloned()
    }

    /// Register `callback` to run synchronously after every mutation, in
    /// registration order.
    pub fn watch(&self, callback: WatchCallback) -> WatchHandle {
        let id = self.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        self.watchers.lock().unwrap().push((id, Arc::from(callback)));
        WatchHandle {
            id,
            watchers: Arc::clone(&self.watchers),
        }
    }

    fn persist<T: serde::Serialize>(&self, key: &str, collection: &T) {
        if let Err(err) = storage::write_json(self.storage.as_ref(), key, collection) {
            warn!(key, %err, "dropping collection write");
        }
    }

    // Snapshot-then-deliver, so a watcher may watch or unwatch while being
    // notified without deadlocking on the registry lock.
    fn notify(&self, collection: Collection) {
        let snapshot: Vec<SharedWatcher> = self
            .watchers
            .lock()
            .unwrap()
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in snapshot {
            callback(collection);
        }
    }
}
