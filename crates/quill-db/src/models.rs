//! Database row types. These map directly to SQLite rows.
//! Distinct from quill-types API models to keep the DB layer independent.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub created_at: String,
}

pub struct NewUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Column values for a profile edit; `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ArticleRow {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<String>,
    pub author_id: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub text: String,
    pub user_id: String,
    pub article_id: String,
    pub created_at: String,
}

/// Timestamps are stored as fixed-width RFC 3339 UTC strings so that
/// lexical order in SQLite matches chronological order.
pub fn encode_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    let at = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("corrupt timestamp '{}'", raw))?;
    Ok(at.with_timezone(&Utc))
}

pub fn decode_id(raw: &str) -> Result<Uuid> {
    raw.parse()
        .with_context(|| format!("corrupt id '{}'", raw))
}
