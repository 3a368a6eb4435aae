use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{NewUser, UserChanges, UserRow};

const USER_COLUMNS: &str = "id, username, email, password, bio, image, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        bio: row.get(4)?,
        image: row.get(5)?,
        created_at: row.get(6)?,
    })
}

pub fn insert(conn: &Connection, user: &NewUser) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, username, email, password, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            &user.id,
            &user.username,
            &user.email,
            &user.password_hash,
            &user.created_at,
        ),
    )?;
    Ok(())
}

fn find_one(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");
    let row = conn
        .query_row(&sql, [value], user_from_row)
        .optional()?;
    Ok(row)
}

pub fn find_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    find_one(conn, "id", id)
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    find_one(conn, "username", username)
}

pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<UserRow>> {
    find_one(conn, "email", email)
}

/// Applies the present fields of `changes`. Returns false if no user has `id`.
pub fn update(conn: &Connection, id: &str, changes: &UserChanges) -> Result<bool> {
    let updated = conn.execute(
        "UPDATE users SET
            username = COALESCE(?2, username),
            email    = COALESCE(?3, email),
            bio      = COALESCE(?4, bio),
            image    = COALESCE(?5, image)
         WHERE id = ?1",
        (
            id,
            &changes.username,
            &changes.email,
            &changes.bio,
            &changes.image,
        ),
    )?;
    Ok(updated == 1)
}
