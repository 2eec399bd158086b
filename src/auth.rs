//! Auth façade: the verbs pages call to change identity.
//!
//! Each verb routes through the configured identity provider, persists the
//! result in the session store (the single writer of the session record),
//! and triggers a CRM identity sync. The sync's mirror write completes
//! before the verb returns; its collector send is a detached task the
//! caller never waits on. Sign-out does not sync.

use std::sync::Arc;

use crate::crm::CrmClient;
use crate::error::Error;
use crate::identity::{Identity, IdentityPatch};
use crate::provider::IdentityProvider;
use crate::session::SessionStore;

/// Single entry point for identity changes.
pub struct Auth {
    provider: Arc<dyn IdentityProvider>,
    session: Arc<SessionStore>,
    crm: Arc<CrmClient>,
}

impl Auth {
    pub(crate) fn new(
        provider: Arc<dyn IdentityProvider>,
        session: Arc<SessionStore>,
        crm: Arc<CrmClient>,
    ) -> Self {
        Self {
            provider,
            session,
            crm,
        }
    }

    /// Social sign-in with a provider-issued token.
    pub async fn sign_in_with_provider(&self, provider_token: &str) -> Result<Identity, Error> {
        let identity = self.provider.sign_in_with_provider(provider_token).await?;
        self.session.set_current(identity.clone())?;
        self.crm.sync_identity(&identity);
        Ok(identity)
    }

    /// Email/password sign-in.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, Error> {
        let identity = self.provider.sign_in_with_password(email, password).await?;
        self.session.set_current(identity.clone())?;
        self.crm.sync_identity(&identity);
        Ok(identity)
    }

    /// Email/password sign-up.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, Error> {
        let identity = self.provider.sign_up(email, password).await?;
        self.session.set_current(identity.clone())?;
        self.crm.sync_identity(&identity);
        Ok(identity)
    }

    /// Apply a partial profile update to the active identity.
    pub async fn update_profile(&self, patch: IdentityPatch) -> Result<Identity, Error> {
        let current = self
            .session
            .get_current()
            .ok_or_else(|| Error::auth("no active session"))?;
        let updated = self.provider.update_profile(&current, &patch).await?;
        self.session.set_current(updated.clone())?;
        self.crm.sync_identity(&updated);
        Ok(updated)
    }

    /// Sign out and clear the session.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.provider.sign_out().await?;
        self.session.clear()?;
        Ok(())
    }
}
