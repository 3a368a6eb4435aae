use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public view of a user. The edge sets are the two directions of the
/// follow and favourite relations; the password hash never leaves the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub following: Vec<Uuid>,
    pub followers: Vec<Uuid>,
    pub favourites: Vec<Uuid>,
    pub my_articles: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<String>,
    pub tags_count: usize,
    pub author: Uuid,
    pub favourites: Vec<Uuid>,
    pub favourites_count: usize,
    /// Comment ids, oldest first.
    pub comments: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub text: String,
    pub user: Uuid,
    pub article: Uuid,
    pub created_at: DateTime<Utc>,
}
