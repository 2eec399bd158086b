//! Identity-provider capability.
//!
//! The auth façade works against this trait and never inspects which
//! implementation is behind it. [`RemoteProvider`] forwards every verb to a
//! configured upstream provider; [`LocalProvider`] is the disconnected
//! simulation used when no provider is configured.

mod local;
mod remote;

use async_trait::async_trait;

use crate::error::Error;
use crate::identity::{Identity, IdentityPatch};

pub use local::LocalProvider;
pub use remote::RemoteProvider;

/// Upstream identity-provider capability.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Social sign-in with a provider-issued token.
    async fn sign_in_with_provider(&self, provider_token: &str) -> Result<Identity, Error>;

    /// Email/password sign-in.
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> Result<Identity, Error>;

    /// Email/password sign-up.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, Error>;

    /// Apply a partial profile update to the given identity.
    async fn update_profile(
        &self,
        current: &Identity,
        patch: &IdentityPatch,
    ) -> Result<Identity, Error>;

    /// Sign out of the upstream provider.
    async fn sign_out(&self) -> Result<(), Error>;
}
