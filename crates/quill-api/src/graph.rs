//! Follow (user → user) and favourite (user → article) toggles.
//!
//! Each toggle is check-then-write inside one IMMEDIATE transaction over a
//! single edge row, so both endpoint sets change together or not at all.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use quill_db::models::encode_time;
use quill_db::{Database, articles, edges, users};
use quill_types::models::{Article, Profile};
use quill_types::validation::normalize_username;

use crate::articles::{not_found as article_not_found, project_one};
use crate::error::ApiError;
use crate::extract::{parse_id, reply};
use crate::middleware::CurrentUser;
use crate::profiles::load_profile;
use crate::state::{AppState, blocking};

pub async fn follow_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = blocking(&state, move |s| follow(&s.db, &user, &username)).await?;
    Ok(reply(StatusCode::OK, "You just followed this user!", profile))
}

pub async fn unfollow_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = blocking(&state, move |s| unfollow(&s.db, &user, &username)).await?;
    Ok(reply(StatusCode::OK, "You just unfollowed this user!", profile))
}

pub async fn favourite_article(
    State(state): State<AppState>,
    Path(article): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id = parse_id(&article, "Article")?;
    let article = blocking(&state, move |s| favourite(&s.db, &user, article_id)).await?;
    Ok(reply(StatusCode::OK, "Article favourited!", article))
}

pub async fn unfavourite_article(
    State(state): State<AppState>,
    Path(article): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id = parse_id(&article, "Article")?;
    let article = blocking(&state, move |s| unfavourite(&s.db, &user, article_id)).await?;
    Ok(reply(StatusCode::OK, "Article unfavourited!", article))
}

#[derive(Clone, Copy)]
enum Toggle {
    On,
    Off,
}

/// Adds or removes the follow edge `actor → username` and returns the
/// target's updated profile.
fn toggle_follow(db: &Database, actor: &CurrentUser, username: &str, toggle: Toggle) -> Result<Profile, ApiError> {
    let username = normalize_username(username);
    let actor_id = actor.id.to_string();

    db.with_tx(|tx| {
        let target = users::find_by_username(tx, &username)?
            .ok_or_else(|| ApiError::NotFound("Username doesn't exist".into()))?;
        if target.id == actor_id {
            return Err(ApiError::Forbidden(match toggle {
                Toggle::On => "You can't follow yourself".into(),
                Toggle::Off => "You can't unfollow yourself".into(),
            }));
        }

        match toggle {
            Toggle::On => {
                if !edges::insert_follow(tx, &actor_id, &target.id, &encode_time(Utc::now()))? {
                    return Err(ApiError::Conflict("You already follow this user".into()));
                }
            }
            Toggle::Off => {
                if !edges::delete_follow(tx, &actor_id, &target.id)? {
                    return Err(ApiError::Conflict("You are not following this user".into()));
                }
            }
        }

        Ok(load_profile(tx, target)?)
    })
}

pub fn follow(db: &Database, actor: &CurrentUser, username: &str) -> Result<Profile, ApiError> {
    let profile = toggle_follow(db, actor, username, Toggle::On)?;
    info!(follower = %actor.id, followee = %profile.id, "Follow edge created");
    Ok(profile)
}

pub fn unfollow(db: &Database, actor: &CurrentUser, username: &str) -> Result<Profile, ApiError> {
    let profile = toggle_follow(db, actor, username, Toggle::Off)?;
    info!(follower = %actor.id, followee = %profile.id, "Follow edge removed");
    Ok(profile)
}

fn toggle_favourite(db: &Database, actor: &CurrentUser, article_id: Uuid, toggle: Toggle) -> Result<Article, ApiError> {
    let actor_id = actor.id.to_string();

    db.with_tx(|tx| {
        let article = articles::find_by_id(tx, &article_id.to_string())?.ok_or_else(article_not_found)?;

        match toggle {
            Toggle::On => {
                if !edges::insert_favourite(tx, &actor_id, &article.id, &encode_time(Utc::now()))? {
                    return Err(ApiError::Conflict("You already favourited this article".into()));
                }
            }
            Toggle::Off => {
                if !edges::delete_favourite(tx, &actor_id, &article.id)? {
                    return Err(ApiError::Conflict("You have not favourited this article".into()));
                }
            }
        }

        Ok(project_one(tx, article)?)
    })
}

pub fn favourite(db: &Database, actor: &CurrentUser, article_id: Uuid) -> Result<Article, ApiError> {
    let article = toggle_favourite(db, actor, article_id, Toggle::On)?;
    info!(user = %actor.id, %article_id, "Favourite edge created");
    Ok(article)
}

pub fn unfavourite(db: &Database, actor: &CurrentUser, article_id: Uuid) -> Result<Article, ApiError> {
    let article = toggle_favourite(db, actor, article_id, Toggle::Off)?;
    info!(user = %actor.id, %article_id, "Favourite edge removed");
    Ok(article)
}
