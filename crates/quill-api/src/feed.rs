use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use quill_db::{Database, articles};
use quill_types::api::Page;
use quill_types::models::Article;

use crate::articles::project;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::extract::reply;
use crate::pagination::Pagination;
use crate::state::{AppState, blocking};

pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    pagination: Pagination,
) -> Result<impl IntoResponse, ApiError> {
    let page = blocking(&state, move |s| feed(&s.db, &user, pagination)).await?;
    Ok(reply(StatusCode::OK, "success", page))
}

/// Articles by everyone `actor` follows, newest first. Following nobody
/// gives an empty page.
pub fn feed(db: &Database, actor: &CurrentUser, pagination: Pagination) -> Result<Page<Article>, ApiError> {
    db.with_conn(|conn| {
        let rows = articles::list_by_followed_authors(
            conn,
            &actor.id.to_string(),
            pagination.limit(),
            pagination.offset(),
        )?;
        Ok(Page::new(pagination.page, project(conn, rows)?))
    })
}
