use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            email       TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            bio         TEXT,
            image       TEXT,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS articles (
            id          TEXT PRIMARY KEY,
            slug        TEXT NOT NULL UNIQUE,
            title       TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            body        TEXT NOT NULL,
            tags        TEXT NOT NULL DEFAULT '[]',
            author_id   TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_articles_created
            ON articles(created_at);

        CREATE INDEX IF NOT EXISTS idx_articles_author
            ON articles(author_id, created_at);

        CREATE TABLE IF NOT EXISTS comments (
            id          TEXT PRIMARY KEY,
            text        TEXT NOT NULL,
            user_id     TEXT NOT NULL REFERENCES users(id),
            article_id  TEXT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_comments_article
            ON comments(article_id, created_at);

        -- One row per edge: follower.following and followee.followers
        CREATE TABLE IF NOT EXISTS follows (
            follower_id TEXT NOT NULL REFERENCES users(id),
            followee_id TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL,
            PRIMARY KEY (follower_id, followee_id),
            CHECK (follower_id <> followee_id)
        );

        CREATE INDEX IF NOT EXISTS idx_follows_followee
            ON follows(followee_id);

        -- One row per edge: user.favourites and article.favourites
        CREATE TABLE IF NOT EXISTS favourites (
            user_id     TEXT NOT NULL REFERENCES users(id),
            article_id  TEXT NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
            created_at  TEXT NOT NULL,
            PRIMARY KEY (user_id, article_id)
        );

        CREATE INDEX IF NOT EXISTS idx_favourites_article
            ON favourites(article_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
