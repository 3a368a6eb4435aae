use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};

use crate::models::CommentRow;

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        text: row.get(1)?,
        user_id: row.get(2)?,
        article_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn insert(conn: &Connection, comment: &CommentRow) -> Result<()> {
    conn.execute(
        "INSERT INTO comments (id, text, user_id, article_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            comment.id,
            comment.text,
            comment.user_id,
            comment.article_id,
            comment.created_at,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<CommentRow>> {
    let row = conn
        .query_row(
            "SELECT id, text, user_id, article_id, created_at FROM comments WHERE id = ?1",
            [id],
            comment_from_row,
        )
        .optional()?;
    Ok(row)
}

pub fn delete(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM comments WHERE id = ?1", [id])?;
    Ok(deleted == 1)
}

/// Comments on one article, oldest first.
pub fn list_for_article(conn: &Connection, article_id: &str) -> Result<Vec<CommentRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, text, user_id, article_id, created_at FROM comments
         WHERE article_id = ?1
         ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map([article_id], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Batch-fetch `(article_id, comment_id)` pairs for a page of articles,
/// oldest comment first within each article.
pub fn ids_for_articles(conn: &Connection, article_ids: &[String]) -> Result<Vec<(String, String)>> {
    if article_ids.is_empty() {
        return Ok(vec![]);
    }

    let placeholders: Vec<String> = (1..=article_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT article_id, id FROM comments WHERE article_id IN ({})
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn comment(id: &str, user_id: &str, article_id: &str, at: &str) -> CommentRow {
        CommentRow {
            id: id.into(),
            text: format!("comment {id}"),
            user_id: user_id.into(),
            article_id: article_id.into(),
            created_at: at.into(),
        }
    }

    #[test]
    fn comments_are_listed_oldest_first() {
        let db = test_support::db();
        db.with_conn(|conn| {
            let alice = test_support::user(conn, "alice");
            let article = test_support::article(conn, &alice, "Some Post", 0);
            insert(conn, &comment("late", &alice, &article, "2024-01-02T00:00:00.000000Z"))?;
            insert(conn, &comment("early", &alice, &article, "2024-01-01T00:00:00.000000Z"))?;

            let ids: Vec<String> = list_for_article(conn, &article)?
                .into_iter()
                .map(|c| c.id)
                .collect();
            assert_eq!(ids, vec!["early", "late"]);

            assert!(delete(conn, "early")?);
            assert!(!delete(conn, "early")?);
            assert_eq!(list_for_article(conn, &article)?.len(), 1);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }

    #[test]
    fn batch_lookup_groups_by_article() {
        let db = test_support::db();
        db.with_conn(|conn| {
            let alice = test_support::user(conn, "alice");
            let first = test_support::article(conn, &alice, "First Post", 10);
            let second = test_support::article(conn, &alice, "Second Post", 0);
            insert(conn, &comment("a", &alice, &first, "2024-01-01T00:00:00.000000Z"))?;
            insert(conn, &comment("b", &alice, &second, "2024-01-01T00:00:01.000000Z"))?;

            assert!(ids_for_articles(conn, &[])?.is_empty());

            let pairs = ids_for_articles(conn, &[first.clone()])?;
            assert_eq!(pairs, vec![(first.clone(), "a".to_string())]);

            let pairs = ids_for_articles(conn, &[first, second])?;
            assert_eq!(pairs.len(), 2);
            Ok::<_, anyhow::Error>(())
        })
        .unwrap();
    }
}
