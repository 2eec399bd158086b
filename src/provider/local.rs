//! Local simulation of the identity provider.
//!
//! Used when no upstream provider is configured. Verbs never fail on
//! well-formed input: when no matching identity exists, one is manufactured.
//! The stored session record doubles as the simulation's user database,
//! which is why email sign-in reuses the active session when present. Demo
//! behavior only; a real backend must replace this with actual validation.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Error;
use crate::identity::{CreatorStatus, Identity, IdentityPatch, Role, SubscriptionTier};
use crate::provider::IdentityProvider;
use crate::session::SessionStore;

/// The never-fails simulation adapter.
pub struct LocalProvider {
    session: Arc<SessionStore>,
}

impl LocalProvider {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    fn manufacture(email: &str, display_name: &str, email_verified: bool) -> Identity {
        Identity {
            id: format!("local-{}", Uuid::new_v4()),
            email: email.to_string(),
            display_name: display_name.to_string(),
            avatar_url: None,
            role: Role::User,
            mobile: None,
            email_verified,
            mobile_verified: false,
            creator_status: CreatorStatus::None,
            subscription_tier: SubscriptionTier::Free,
        }
    }
}

fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[async_trait]
impl IdentityProvider for LocalProvider {
    async fn sign_in_with_provider(&self, _provider_token: &str) -> Result<Identity, Error> {
        // Social sign-in implies a verified email address.
        Ok(Self::manufacture("user@cenner.io", "New User", true))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        _password: &str,
    ) -> Result<Identity, Error> {
        match self.session.get_current() {
            Some(existing) => Ok(existing),
            None => Ok(Self::manufacture(email, local_part(email), false)),
        }
    }

    async fn sign_up(&self, email: &str, _password: &str) -> Result<Identity, Error> {
        Ok(Self::manufacture(email, local_part(email), false))
    }

    async fn update_profile(
        &self,
        current: &Identity,
        patch: &IdentityPatch,
    ) -> Result<Identity, Error> {
        Ok(current.apply(patch))
    }

    async fn sign_out(&self) -> Result<(), Error> {
        Ok(())
    }
}
