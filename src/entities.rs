//! Marketplace entity models: listings, jobs, and blog posts.
//!
//! Owner/author fields are denormalized snapshots taken at creation time.
//! There is no edit capability, so a later identity change does not update
//! previously created entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Urgency of a job posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// A service offered by a freelancer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub delivery_time: String,
    pub freelancer_id: String,
    pub freelancer_name: String,
    pub freelancer_avatar: String,
    pub rating: f64,
    pub reviews_count: u32,
    pub image_url: String,
}

/// A job posted by a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub budget_range: String,
    pub client_id: String,
    pub client_name: String,
    pub client_avatar: String,
    pub posted_at: DateTime<Utc>,
    pub proposals_count: u32,
    pub urgency: Urgency,
}

/// A forum/blog article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub author: String,
    pub author_avatar: String,
    pub content: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
    pub votes: i64,
    pub comment_count: u32,
}

/// A comment on a blog post; replies nest without bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogComment {
    pub id: String,
    pub author: String,
    pub author_avatar: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub votes: i64,
    #[serde(default)]
    pub replies: Vec<BlogComment>,
}

/// Generate a collision-resistant entity id with a readable prefix,
/// e.g. `listing_3f1c…`.
pub fn generate_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4())
}
