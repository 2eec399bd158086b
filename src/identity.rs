//! Identity model: the authenticated principal and its partial updates.

use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Role of the principal on the marketplace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Freelancer,
    Client,
}

/// Creator-program application state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreatorStatus {
    #[default]
    None,
    Pending,
    Approved,
    Rejected,
}

/// Subscription tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Pro,
    Ultra,
}

/// The authenticated principal.
///
/// Everything beyond `id` and `email` defaults when absent so a minimal
/// provider response still parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub mobile_verified: bool,
    #[serde(default)]
    pub creator_status: CreatorStatus,
    #[serde(default)]
    pub subscription_tier: SubscriptionTier,
}

/// Partial profile update applied by the update-profile verb.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityPatch {
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Avatar reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

impl Identity {
    /// Apply a partial update, returning the patched identity.
    pub fn apply(&self, patch: &IdentityPatch) -> Identity {
        let mut updated = self.clone();
        if let Some(name) = &patch.display_name {
            updated.display_name = name.clone();
        }
        if let Some(avatar) = &patch.avatar_url {
            updated.avatar_url = Some(avatar.clone());
        }
        if let Some(mobile) = &patch.mobile {
            updated.mobile = Some(mobile.clone());
        }
        updated
    }
}

#[derive(Serialize)]
struct IdTokenClaims<'a> {
    sub: &'a str,
    email: &'a str,
    exp: i64,
}

// Demo signing key for the collector side channel, which has no verifier
// of its own. Provider calls use the provider-issued token instead.
const ID_TOKEN_KEY: &[u8] = b"cenner-demo-signing-key";
const ID_TOKEN_TTL_SECS: i64 = 3600;

/// Mint a bearer token for the given identity.
///
/// Collector requests attach this when a session is active; it stands in for
/// the provider-issued token in the simulated path.
pub fn mint_id_token(identity: &Identity) -> Result<String, Error> {
    let claims = IdTokenClaims {
        sub: &identity.id,
        email: &identity.email,
        exp: Utc::now().timestamp() + ID_TOKEN_TTL_SECS,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(ID_TOKEN_KEY),
    )?)
}
