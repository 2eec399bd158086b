//! CRM sync client.
//!
//! Maintains a local mirror of identity, payment, and analytics data under
//! one storage record, and forwards each change to the remote collector.
//! The mirror is never authoritative; the session identity always wins.
//!
//! Every collector send is best-effort: a detached task, at most one
//! attempt, failures logged and dropped. Nothing in this module may block
//! or fail the auth flow that triggered it, so local storage failures are
//! logged and dropped as well.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CLIENT_INFO;
use crate::fetch::FetchBuilder;
use crate::identity::{mint_id_token, CreatorStatus, Identity, SubscriptionTier};
use crate::session::SessionStore;
use crate::storage::{self, Storage, CRM_KEY};

/// Payment classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentKind {
    Subscription,
    Service,
}

/// Which contact channel a verification applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Email,
    Mobile,
}

/// Analytics event classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Pageview,
}

/// Acquisition metadata attached to every mirror record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionMetadata {
    pub source: String,
    pub campaign: String,
}

impl Default for AcquisitionMetadata {
    fn default() -> Self {
        Self {
            source: "web_portal".to_string(),
            campaign: "launch_v2".to_string(),
        }
    }
}

/// Non-authoritative per-user copy of identity data held for CRM purposes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRecord {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub creator_status: CreatorStatus,
    pub email_verified: bool,
    pub mobile_verified: bool,
    pub last_synced: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_subscription_update: Option<DateTime<Utc>>,
    pub crm_status: String,
    pub metadata: AcquisitionMetadata,
}

impl MirrorRecord {
    fn from_identity(identity: &Identity) -> Self {
        Self {
            uid: identity.id.clone(),
            email: identity.email.clone(),
            display_name: identity.display_name.clone(),
            avatar_url: identity.avatar_url.clone(),
            mobile: identity.mobile.clone(),
            subscription_tier: identity.subscription_tier,
            creator_status: identity.creator_status,
            email_verified: identity.email_verified,
            mobile_verified: identity.mobile_verified,
            last_synced: Utc::now(),
            last_subscription_update: None,
            crm_status: "active".to_string(),
            metadata: AcquisitionMetadata::default(),
        }
    }
}

/// Immutable payment log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    #[serde(rename = "type")]
    pub kind: PaymentKind,
    pub description: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Fire-and-forget telemetry entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub path: String,
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub user_agent: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CrmDatabase {
    #[serde(default)]
    users: HashMap<String, MirrorRecord>,
    #[serde(default)]
    payments: Vec<PaymentRecord>,
    #[serde(default)]
    analytics: Vec<AnalyticsEvent>,
}

/// Client mirroring identity/financial/analytics data and forwarding it,
/// best-effort, to the remote collector.
pub struct CrmClient {
    collector_url: String,
    client: Client,
    storage: Arc<dyn Storage>,
    session: Arc<SessionStore>,
}

impl CrmClient {
    pub(crate) fn new(
        collector_url: &str,
        client: Client,
        storage: Arc<dyn Storage>,
        session: Arc<SessionStore>,
    ) -> Self {
        Self {
            collector_url: collector_url.trim_end_matches('/').to_string(),
            client,
            storage,
            session,
        }
    }

    /// Upsert the mirror record for `identity` and forward it to the
    /// collector.
    pub fn sync_identity(&self, identity: &Identity) {
        debug!(uid = %identity.id, "syncing identity to CRM mirror");

        let mut db = self.load();
        db.users
            .insert(identity.id.clone(), MirrorRecord::from_identity(identity));
        self.save(&db);

        self.forward(
            Method::POST,
            "/users".to_string(),
            json!({
                "uid": identity.id,
                "email": identity.email,
                "displayName": identity.display_name,
                "mobile": identity.mobile,
                "photoURL": identity.avatar_url,
                "role": identity.role,
                "metadata": AcquisitionMetadata::default(),
            }),
        );
    }

    /// Update the mirror's tier and, when `user_id` is the active session,
    /// the session identity's tier as well.
    pub fn update_subscription_tier(&self, user_id: &str, tier: SubscriptionTier) {
        let now = Utc::now();

        let mut db = self.load();
        if let Some(record) = db.users.get_mut(user_id) {
            record.subscription_tier = tier;
            record.last_subscription_update = Some(now);
        }
        self.save(&db);

        if let Some(current) = self.session.get_current() {
            if current.id == user_id {
                let mut updated = current;
                updated.subscription_tier = tier;
                if let Err(err) = self.session.set_current(updated) {
                    warn!(user_id, %err, "failed to update session tier");
                }
            }
        }

        self.forward(
            Method::PATCH,
            format!("/users/{}", user_id),
            json!({ "subscriptionTier": tier, "updatedAt": now }),
        );
    }

    /// Append an immutable payment record and forward it.
    pub fn log_payment(
        &self,
        user_id: &str,
        amount: f64,
        kind: PaymentKind,
        description: &str,
    ) {
        let record = PaymentRecord {
            id: format!("tx_{}", Uuid::new_v4()),
            user_id: user_id.to_string(),
            amount,
            currency: "EUR".to_string(),
            kind,
            description: description.to_string(),
            status: "completed".to_string(),
            timestamp: Utc::now(),
        };

        let mut db = self.load();
        db.payments.push(record.clone());
        self.save(&db);

        self.forward(
            Method::POST,
            "/payments/transactions".to_string(),
            json!({
                "userId": record.user_id,
                "amount": record.amount,
                "currency": record.currency,
                "type": record.kind,
                "description": record.description,
                "status": record.status,
                "timestamp": record.timestamp,
            }),
        );
    }

    /// Append a pageview event and forward it. Anonymous tracking is
    /// permitted; callers never await the send.
    pub fn track_pageview(&self, path: &str, user_id: Option<&str>) {
        let event = AnalyticsEvent {
            kind: EventKind::Pageview,
            path: path.to_string(),
            user_id: user_id.map(str::to_string),
            timestamp: Utc::now(),
            user_agent: CLIENT_INFO.to_string(),
        };

        let mut db = self.load();
        db.analytics.push(event.clone());
        self.save(&db);

        self.forward(
            Method::POST,
            "/analytics/traffic".to_string(),
            json!({
                "path": event.path,
                "userId": event.user_id,
                "timestamp": event.timestamp,
                "userAgent": event.user_agent,
            }),
        );
    }

    /// Mark a contact channel verified in the mirror and, when `user_id` is
    /// the active session, in the session identity as well.
    pub fn verify_contact(&self, user_id: &str, kind: ContactKind) {
        let mut db = self.load();
        let mut verified_flags = None;
        if let Some(record) = db.users.get_mut(user_id) {
            match kind {
                ContactKind::Email => record.email_verified = true,
                ContactKind::Mobile => record.mobile_verified = true,
            }
            verified_flags = Some((record.email_verified, record.mobile_verified));
        }
        self.save(&db);

        if let Some(current) = self.session.get_current() {
            if current.id == user_id {
                let mut updated = current;
                match kind {
                    ContactKind::Email => updated.email_verified = true,
                    ContactKind::Mobile => updated.mobile_verified = true,
                }
                if verified_flags.is_none() {
                    verified_flags = Some((updated.email_verified, updated.mobile_verified));
                }
                if let Err(err) = self.session.set_current(updated) {
                    warn!(user_id, %err, "failed to update session verification");
                }
            }
        }

        if let Some((email_verified, mobile_verified)) = verified_flags {
            self.forward(
                Method::PATCH,
                format!("/users/{}", user_id),
                json!({
                    "emailVerified": email_verified,
                    "mobileVerified": mobile_verified,
                }),
            );
        }
    }

    /// The mirror record for `user_id`, if one has been synced.
    pub fn mirror_record(&self, user_id: &str) -> Option<MirrorRecord> {
        self.load().users.get(user_id).cloned()
    }

    /// The payment log, in append order.
    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.load().payments
    }

    /// The analytics log, in append order.
    pub fn analytics(&self) -> Vec<AnalyticsEvent> {
        self.load().analytics
    }

    fn load(&self) -> CrmDatabase {
        storage::read_json(self.storage.as_ref(), CRM_KEY).unwrap_or_default()
    }

    fn save(&self, db: &CrmDatabase) {
        if let Err(err) = storage::write_json(self.storage.as_ref(), CRM_KEY, db) {
            warn!(%err, "dropping CRM mirror write");
        }
    }

    /// Detach a best-effort send to the collector.
    ///
    /// A bearer token derived from the active identity is attached when a
    /// session exists. Without one, analytics still goes out anonymously;
    /// everything else is skipped, matching the collector's auth contract.
    fn forward(&self, method: Method, endpoint: String, body: serde_json::Value) {
        let identity = self.session.get_current();
        if identity.is_none() && !endpoint.starts_with("/analytics") {
            debug!(%endpoint, "skipping collector send with no active session");
            return;
        }

        let token = identity.as_ref().and_then(|id| match mint_id_token(id) {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(%err, "sending to collector without bearer token");
                None
            }
        });

        let client = self.client.clone();
        let url = format!("{}{}", self.collector_url, endpoint);

        // Without an ambient runtime the send is dropped like any other
        // best-effort failure; the local write has already happened.
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(%url, "dropping best-effort collector send: no async runtime");
                return;
            }
        };

        runtime.spawn(async move {
            let mut request = FetchBuilder::new(&client, &url, method);
            if let Some(token) = &token {
                request = request.bearer_auth(token);
            }
            let result = match request.json(&body) {
                Ok(request) => request.execute_unit().await,
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                warn!(%url, %err, "dropping best-effort collector send");
            }
        });
    }
}
