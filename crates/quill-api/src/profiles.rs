use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use tracing::info;

use quill_db::models::{UserChanges, UserRow, decode_id};
use quill_db::{Database, articles, edges, users};
use quill_types::api::UpdateProfileRequest;
use quill_types::models::Profile;
use quill_types::validation::{normalize_email, normalize_username};

use crate::error::ApiError;
use crate::extract::{ValidatedJson, reply};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub async fn show(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = blocking(&state, move |s| get_profile(&s.db, &username)).await?;
    Ok(reply(StatusCode::OK, "success", profile))
}

pub async fn update(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = blocking(&state, move |s| update_profile(&s.db, &user, &username, req)).await?;
    Ok(reply(StatusCode::OK, "Profile updated!", profile))
}

fn not_found() -> ApiError {
    ApiError::NotFound("User with given username not found!".into())
}

pub fn get_profile(db: &Database, username: &str) -> Result<Profile, ApiError> {
    let username = normalize_username(username);
    db.with_conn(|conn| {
        let user = users::find_by_username(conn, &username)?.ok_or_else(not_found)?;
        Ok(load_profile(conn, user)?)
    })
}

/// Owner-only edit of username, email, bio and image.
pub fn update_profile(
    db: &Database,
    actor: &CurrentUser,
    username: &str,
    req: UpdateProfileRequest,
) -> Result<Profile, ApiError> {
    let username = normalize_username(username);
    let changes = UserChanges {
        username: req.username.as_deref().map(normalize_username),
        email: req.email.as_deref().map(normalize_email),
        bio: req.bio.map(|b| b.trim().to_string()),
        image: req.image.map(|i| i.trim().to_string()),
    };

    db.with_tx(|tx| {
        let target = users::find_by_username(tx, &username)?.ok_or_else(not_found)?;
        if target.id != actor.id.to_string() {
            return Err(ApiError::Unauthorized("You can't edit this profile!".into()));
        }

        if let Some(new_username) = &changes.username {
            if let Some(other) = users::find_by_username(tx, new_username)? {
                if other.id != target.id {
                    return Err(ApiError::Conflict("User already taken.".into()));
                }
            }
        }
        if let Some(new_email) = &changes.email {
            if let Some(other) = users::find_by_email(tx, new_email)? {
                if other.id != target.id {
                    return Err(ApiError::Conflict("Email already in use.".into()));
                }
            }
        }

        users::update(tx, &target.id, &changes)?;
        let updated = users::find_by_id(tx, &target.id)?.ok_or_else(not_found)?;
        info!(user_id = %actor.id, "Profile updated");
        Ok(load_profile(tx, updated)?)
    })
}

/// Assembles a profile with both directions of each edge set.
pub(crate) fn load_profile(conn: &Connection, user: UserRow) -> anyhow::Result<Profile> {
    let decode_all = |ids: Vec<String>| {
        ids.iter()
            .map(|id| decode_id(id))
            .collect::<anyhow::Result<Vec<_>>>()
    };

    Ok(Profile {
        id: decode_id(&user.id)?,
        following: decode_all(edges::following_ids(conn, &user.id)?)?,
        followers: decode_all(edges::follower_ids(conn, &user.id)?)?,
        favourites: decode_all(edges::favourite_ids(conn, &user.id)?)?,
        my_articles: decode_all(articles::ids_by_author(conn, &user.id)?)?,
        username: user.username,
        email: user.email,
        bio: user.bio,
        image: user.image,
    })
}
