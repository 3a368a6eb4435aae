//! HTTP surface of quill: the identity, content, comment, edge and feed
//! operations, plus the bearer-token guard in front of them.

pub mod articles;
pub mod auth;
pub mod comments;
pub mod config;
pub mod error;
pub mod extract;
pub mod feed;
pub mod graph;
pub mod middleware;
pub mod pagination;
pub mod profiles;
pub mod state;

use axum::{
    Json, Router,
    http::StatusCode,
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use quill_types::api::ErrorBody;

use crate::extract::reply;
use crate::middleware::require_auth;
use crate::state::AppState;

/// Every route lives under this prefix.
pub const API_PREFIX: &str = "/api/v1";

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(welcome))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route(
            "/profile/{username}",
            get(profiles::show).put(profiles::update).patch(profiles::update),
        )
        .route("/{username}/follow", post(graph::follow_user))
        .route("/{username}/unfollow", post(graph::unfollow_user))
        .route("/feed", get(feed::show))
        .route("/articles", get(articles::index).post(articles::create))
        .route(
            "/articles/{article}",
            get(articles::show).put(articles::update).delete(articles::destroy),
        )
        .route(
            "/articles/{article}/comments",
            get(comments::index).post(comments::create),
        )
        .route(
            "/articles/{article}/comments/{comment}",
            delete(comments::destroy_on_article),
        )
        .route("/articles/comments/{comment}", delete(comments::destroy))
        .route("/articles/{article}/favourite", post(graph::favourite_article))
        .route("/articles/{article}/unfavourite", post(graph::unfavourite_article))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .method_not_allowed_fallback(method_not_allowed);

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn welcome() -> impl IntoResponse {
    reply(StatusCode::OK, "success", "Welcome to the API")
}

async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody::new(StatusCode::NOT_FOUND.as_u16(), "route is invalid")),
    )
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new(
            StatusCode::METHOD_NOT_ALLOWED.as_u16(),
            "method is not allowed on this route",
        )),
    )
}

#[cfg(test)]
pub(crate) mod test_support {
    use quill_db::Database;
    use quill_types::api::SignupRequest;

    use crate::auth;
    use crate::config::AuthConfig;
    use crate::middleware::CurrentUser;
    use crate::state::{AppState, AppStateInner};

    pub fn state() -> AppState {
        AppStateInner::new(
            Database::open_in_memory().unwrap(),
            AuthConfig::new("test-secret"),
        )
    }

    /// Registers `username` with email `{username}@x.com` and password `pw12345`.
    pub fn user(state: &AppState, username: &str) -> CurrentUser {
        let session = auth::register(
            &state.db,
            &state.auth,
            SignupRequest {
                username: username.into(),
                email: format!("{username}@x.com"),
                password: "pw12345".into(),
            },
        )
        .unwrap();
        CurrentUser {
            id: session.user_id,
            username: session.username,
        }
    }
}
