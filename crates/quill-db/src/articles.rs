use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::models::ArticleRow;

const ARTICLE_COLUMNS: &str =
    "a.id, a.slug, a.title, a.description, a.body, a.tags, a.author_id, a.created_at, a.updated_at";

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleRow> {
    let tags: String = row.get(5)?;
    let tags = serde_json::from_str(&tags).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ArticleRow {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        body: row.get(4)?,
        tags,
        author_id: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

pub fn insert(conn: &Connection, article: &ArticleRow) -> Result<()> {
    conn.execute(
        "INSERT INTO articles (id, slug, title, description, body, tags, author_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            article.id,
            article.slug,
            article.title,
            article.description,
            article.body,
            serde_json::to_string(&article.tags)?,
            article.author_id,
            article.created_at,
            article.updated_at,
        ],
    )?;
    Ok(())
}

/// Rewrites every mutable column. `author_id` and `created_at` never change.
pub fn update(conn: &Connection, article: &ArticleRow) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE articles
         SET slug = ?2, title = ?3, description = ?4, body = ?5, tags = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            article.id,
            article.slug,
            article.title,
            article.description,
            article.body,
            serde_json::to_string(&article.tags)?,
            article.updated_at,
        ],
    )?;
    Ok(updated == 1)
}

/// Deletes the article. Its comments and favourite edges go with it via
/// `ON DELETE CASCADE`.
pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM articles WHERE id = ?1", [id])?;
    Ok(deleted == 1)
}

fn find_one(conn: &Connection, column: &str, value: &str) -> Result<Option<ArticleRow>> {
    let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles a WHERE a.{column} = ?1");
    let row = conn
        .query_row(&sql, [value], article_from_row)
        .optional()?;
    Ok(row)
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<ArticleRow>> {
    find_one(conn, "id", id)
}

pub fn find_by_slug(conn: &Connection, slug: &str) -> Result<Option<ArticleRow>> {
    find_one(conn, "slug", slug)
}

/// Id of another article already holding `title` or `slug`, if any.
pub fn find_clash(
    conn: &Connection,
    title: &str,
    slug: &str,
    except_id: Option<&str>,
) -> Result<Option<String>> {
    let id = conn
        .query_row(
            "SELECT id FROM articles
             WHERE (title = ?1 OR slug = ?2) AND (?3 IS NULL OR id <> ?3)
             LIMIT 1",
            params![title, slug, except_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Newest first; ties broken by insertion order.
pub fn list_recent(conn: &Connection, limit: i64, offset: i64) -> Result<Vec<ArticleRow>> {
    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles a
         ORDER BY a.created_at DESC, a.rowid DESC
         LIMIT ?1 OFFSET ?2"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![limit, offset], article_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Articles written by anyone `follower_id` follows, newest first.
pub fn list_by_followed_authors(
    conn: &Connection,
    follower_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<ArticleRow>> {
    // JOIN follows so the whole page comes back in one query
    let sql = format!(
        "SELECT {ARTICLE_COLUMNS} FROM articles a
         JOIN follows f ON f.followee_id = a.author_id
         WHERE f.follower_id = ?1
         ORDER BY a.created_at DESC, a.rowid DESC
         LIMIT ?2 OFFSET ?3"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![follower_id, limit, offset], article_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Ids of articles owned by `author_id`, oldest first.
pub fn ids_by_author(conn: &Connection, author_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT id FROM articles WHERE author_id = ?1 ORDER BY created_at, rowid",
    )?;
    let ids = stmt
        .query_map([author_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ids)
}
