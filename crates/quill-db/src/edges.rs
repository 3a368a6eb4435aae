//! Follow and favourite edges.
//!
//! Each edge is a single row, so both mirrored sets (`following`/`followers`,
//! `User.favourites`/`Article.favourites`) change in one statement. Inserts
//! and deletes report whether the edge actually changed, which lets callers
//! turn a duplicate toggle into a conflict without a separate read.

use anyhow::Result;
use rusqlite::{Connection, params, params_from_iter};

/// Returns false if `follower_id` already follows `followee_id`.
pub fn insert_follow(conn: &Connection, follower_id: &str, followee_id: &str, at: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO follows (follower_id, followee_id, created_at) VALUES (?1, ?2, ?3)",
        params![follower_id, followee_id, at],
    )?;
    Ok(inserted == 1)
}

/// Returns false if there was no such edge.
pub fn delete_follow(conn: &Connection, follower_id: &str, followee_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM follows WHERE follower_id = ?1 AND followee_id = ?2",
        params![follower_id, followee_id],
    )?;
    Ok(deleted == 1)
}

pub fn insert_favourite(conn: &Connection, user_id: &str, article_id: &str, at: &str) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO favourites (user_id, article_id, created_at) VALUES (?1, ?2, ?3)",
        params![user_id, article_id, at],
    )?;
    Ok(inserted == 1)
}

pub fn delete_favourite(conn: &Connection, user_id: &str, article_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM favourites WHERE user_id = ?1 AND article_id = ?2",
        params![user_id, article_id],
    )?;
    Ok(deleted == 1)
}

fn ids(conn: &Connection, sql: &str, key: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([key], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// Users that `user_id` follows.
pub fn following_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    ids(
        conn,
        "SELECT followee_id FROM follows WHERE follower_id = ?1 ORDER BY created_at, rowid",
        user_id,
    )
}

/// Users following `user_id`.
pub fn follower_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    ids(
        conn,
        "SELECT follower_id FROM follows WHERE followee_id = ?1 ORDER BY created_at, rowid",
        user_id,
    )
}

/// Articles `user_id` has favourited.
pub fn favourite_ids(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    ids(
        conn,
        "SELECT article_id FROM favourites WHERE user_id = ?1 ORDER BY created_at, rowid",
        user_id,
    )
}

/// Batch-fetch `(article_id, user_id)` favourite pairs for a page of articles.
pub fn favouriters_for_articles(conn: &Connection, article_ids: &[String]) -> Result<Vec<(String, String)>> {
    if article_ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=article_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT article_id, user_id FROM favourites WHERE article_id IN ({})
         ORDER BY created_at, rowid",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(article_ids.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
