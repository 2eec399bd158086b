//! Cenner client library
//!
//! The client-side session and data layer of the Cenner freelance
//! marketplace: a session store holding the single current identity, an
//! auth façade with interchangeable real and simulated identity providers,
//! a best-effort CRM/analytics sync client, and a persisted reactive store
//! for the marketplace collections.

pub mod auth;
pub mod config;
pub mod crm;
pub mod data;
pub mod entities;
pub mod error;
pub mod fetch;
pub mod identity;
pub mod provider;
pub mod session;
pub mod storage;

use std::sync::Arc;

use reqwest::Client;

use crate::auth::Auth;
use crate::config::ClientOptions;
use crate::crm::CrmClient;
use crate::data::EntityStore;
use crate::error::Error;
use crate::provider::{IdentityProvider, LocalProvider, RemoteProvider};
use crate::session::SessionStore;
use crate::storage::{FileStorage, MemoryStorage, Storage};

/// The main entry point for the Cenner client
pub struct Cenner {
    /// Client options
    pub options: ClientOptions,
    /// HTTP client used for requests
    pub http_client: Client,
    storage: Arc<dyn Storage>,
    session: Arc<SessionStore>,
    crm: Arc<CrmClient>,
    data: Arc<EntityStore>,
    auth: Auth,
}

impl Cenner {
    /// Create a client from options.
    ///
    /// With a configured `storage_dir`, state persists across client
    /// instances; otherwise everything lives in memory. The identity
    /// provider is chosen once here: a configured provider URL and API key
    /// select the remote adapter, anything else the local simulation.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cenner_client::{Cenner, config::ClientOptions};
    ///
    /// let cenner = Cenner::new(ClientOptions::default()).unwrap();
    /// ```
    pub fn new(options: ClientOptions) -> Result<Self, Error> {
        let storage: Arc<dyn Storage> = match &options.storage_dir {
            Some(dir) => Arc::new(FileStorage::new(dir)?),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(options, storage)
    }

    /// Create a client over an injected storage backend.
    pub fn with_storage(options: ClientOptions, storage: Arc<dyn Storage>) -> Result<Self, Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let session = Arc::new(SessionStore::new(Arc::clone(&storage)));
        let crm = Arc::new(CrmClient::new(
            &options.collector_url,
            http_client.clone(),
            Arc::clone(&storage),
            Arc::clone(&session),
        ));

        let provider: Arc<dyn IdentityProvider> =
            match (&options.provider_url, &options.provider_api_key) {
                (Some(url), Some(key)) if options.provider_configured() => {
                    Arc::new(RemoteProvider::new(url, key, http_client.clone()))
                }
                _ => Arc::new(LocalProvider::new(Arc::clone(&session))),
            };

        let auth = Auth::new(provider, Arc::clone(&session), Arc::clone(&crm));
        let data = Arc::new(EntityStore::new(Arc::clone(&storage)));

        Ok(Self {
            options,
            http_client,
            storage,
            session,
            crm,
            data,
            auth,
        })
    }

    /// The auth façade for identity changes
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// The session store holding the current identity
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// The CRM sync client
    pub fn crm(&self) -> &Arc<CrmClient> {
        &self.crm
    }

    /// The entity store for listings, jobs, and blog posts
    pub fn data(&self) -> &Arc<EntityStore> {
        &self.data
    }

    /// The durable storage backend
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::identity::{Identity, IdentityPatch, SubscriptionTier};
    pub use crate::Cenner;
}
