use std::collections::HashMap;

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use quill_db::models::{ArticleRow, decode_id, decode_time, encode_time};
use quill_db::{Database, articles, comments, edges, users};
use quill_types::api::{CreateArticleRequest, Page, UpdateArticleRequest};
use quill_types::models::Article;
use quill_types::validation::normalize_tags;

use crate::error::ApiError;
use crate::extract::{ValidatedJson, parse_id, reply};
use crate::middleware::CurrentUser;
use crate::pagination::Pagination;
use crate::state::{AppState, blocking};

pub async fn index(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    pagination: Pagination,
) -> Result<impl IntoResponse, ApiError> {
    let page = blocking(&state, move |s| list_articles(&s.db, pagination)).await?;
    Ok(reply(StatusCode::OK, "success", page))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let article = blocking(&state, move |s| create_article(&s.db, &user, req)).await?;
    Ok(reply(StatusCode::CREATED, "Article created!", article))
}

/// `GET /articles/{slug}`
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let article = blocking(&state, move |s| get_by_slug(&s.db, &slug)).await?;
    Ok(reply(StatusCode::OK, "success", article))
}

/// `PUT /articles/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<UpdateArticleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Article")?;
    let article = blocking(&state, move |s| update_article(&s.db, &user, id, req)).await?;
    Ok(reply(StatusCode::OK, "Article updated!", article))
}

/// `DELETE /articles/{id}`
pub async fn destroy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id, "Article")?;
    blocking(&state, move |s| delete_article(&s.db, &user, id)).await?;
    Ok(reply(StatusCode::OK, "Successfully deleted article", id))
}

pub(crate) fn not_found() -> ApiError {
    ApiError::NotFound("Article not found".into())
}

fn not_owner() -> ApiError {
    ApiError::Unauthorized("You're not allowed to perform this action".into())
}

fn title_taken() -> ApiError {
    ApiError::Conflict("Article exists!".into())
}

/// Slugs are a pure function of the title.
pub fn slug_for(title: &str) -> Result<String, ApiError> {
    let slug = slug::slugify(title);
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "title must contain letters or digits".into(),
        ));
    }
    Ok(slug)
}

pub fn create_article(
    db: &Database,
    author: &CurrentUser,
    req: CreateArticleRequest,
) -> Result<Article, ApiError> {
    let title = req.title.trim().to_string();
    let slug = slug_for(&title)?;
    let now = encode_time(Utc::now());
    let row = ArticleRow {
        id: Uuid::new_v4().to_string(),
        slug,
        title,
        description: req.description.trim().to_string(),
        body: req.body.trim().to_string(),
        tags: normalize_tags(&req.tags),
        author_id: author.id.to_string(),
        created_at: now.clone(),
        updated_at: now,
    };

    let article = db.with_tx(|tx| {
        if users::find_by_id(tx, &row.author_id)?.is_none() {
            return Err(ApiError::NotFound("User not found.".into()));
        }
        if articles::find_clash(tx, &row.title, &row.slug, None)?.is_some() {
            return Err(title_taken());
        }
        articles::insert(tx, &row)?;
        Ok(project_one(tx, row)?)
    })?;

    info!(article_id = %article.id, slug = %article.slug, author = %author.id, "Article created");
    Ok(article)
}

pub fn list_articles(db: &Database, pagination: Pagination) -> Result<Page<Article>, ApiError> {
    db.with_conn(|conn| {
        let rows = articles::list_recent(conn, pagination.limit(), pagination.offset())?;
        Ok(Page::new(pagination.page, project(conn, rows)?))
    })
}

pub fn get_by_slug(db: &Database, slug: &str) -> Result<Article, ApiError> {
    db.with_conn(|conn| {
        let row = articles::find_by_slug(conn, slug)?.ok_or_else(not_found)?;
        Ok(project_one(conn, row)?)
    })
}

/// Owner-only edit. A new title re-derives the slug and must not collide
/// with any other article.
pub fn update_article(
    db: &Database,
    actor: &CurrentUser,
    id: Uuid,
    req: UpdateArticleRequest,
) -> Result<Article, ApiError> {
    db.with_tx(|tx| {
        let mut row = articles::find_by_id(tx, &id.to_string())?.ok_or_else(not_found)?;
        if row.author_id != actor.id.to_string() {
            return Err(not_owner());
        }

        if let Some(title) = req.title {
            row.title = title.trim().to_string();
            row.slug = slug_for(&row.title)?;
            if articles::find_clash(tx, &row.title, &row.slug, Some(row.id.as_str()))?.is_some() {
                return Err(title_taken());
            }
        }
        if let Some(description) = req.description {
            row.description = description.trim().to_string();
        }
        if let Some(body) = req.body {
            row.body = body.trim().to_string();
        }
        if let Some(tags) = req.tags {
            row.tags = normalize_tags(&tags);
        }
        row.updated_at = encode_time(Utc::now());

        articles::update(tx, &row)?;
        info!(article_id = %id, slug = %row.slug, "Article updated");
        Ok(project_one(tx, row)?)
    })
}

/// Owner-only. Comments and favourite edges on the article are removed in
/// the same transaction; `myArticles` follows from the row being gone.
pub fn delete_article(db: &Database, actor: &CurrentUser, id: Uuid) -> Result<(), ApiError> {
    db.with_tx(|tx| {
        let row = articles::find_by_id(tx, &id.to_string())?.ok_or_else(not_found)?;
        if row.author_id != actor.id.to_string() {
            return Err(not_owner());
        }
        articles::delete(tx, &row.id)?;
        Ok(())
    })?;

    info!(article_id = %id, author = %actor.id, "Article deleted");
    Ok(())
}

pub(crate) fn project_one(conn: &Connection, row: ArticleRow) -> anyhow::Result<Article> {
    project(conn, vec![row])?
        .pop()
        .ok_or_else(|| anyhow::anyhow!("article projection lost its row"))
}

/// Builds the public view of a page of articles, fetching favourites and
/// comment ids for the whole page at once. Keeps input order.
pub(crate) fn project(conn: &Connection, rows: Vec<ArticleRow>) -> anyhow::Result<Vec<Article>> {
    let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();

    let mut favourites: HashMap<String, Vec<Uuid>> = HashMap::new();
    for (article_id, user_id) in edges::favouriters_for_articles(conn, &ids)? {
        favourites.entry(article_id).or_default().push(decode_id(&user_id)?);
    }

    let mut comment_ids: HashMap<String, Vec<Uuid>> = HashMap::new();
    for (article_id, comment_id) in comments::ids_for_articles(conn, &ids)? {
        comment_ids.entry(article_id).or_default().push(decode_id(&comment_id)?);
    }

    rows.into_iter()
        .map(|row| -> anyhow::Result<Article> {
            let favourites = favourites.remove(&row.id).unwrap_or_default();
            Ok(Article {
                id: decode_id(&row.id)?,
                author: decode_id(&row.author_id)?,
                created_at: decode_time(&row.created_at)?,
                updated_at: decode_time(&row.updated_at)?,
                comments: comment_ids.remove(&row.id).unwrap_or_default(),
                favourites_count: favourites.len(),
                favourites,
                tags_count: row.tags.len(),
                tags: row.tags,
                title: row.title,
                slug: row.slug,
                description: row.description,
                body: row.body,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{comments as comment_store, test_support};
    use quill_types::api::CreateCommentRequest;

    fn req(title: &str) -> CreateArticleRequest {
        CreateArticleRequest {
            title: title.into(),
            description: "A short description".into(),
            body: "The body of the article".into(),
            tags: vec![" rust ".into(), "web".into()],
        }
    }

    #[test]
    fn slug_is_deterministic() {
        assert_eq!(slug_for("Hello World Title").unwrap(), "hello-world-title");
        assert_eq!(slug_for("Hello World Title").unwrap(), slug_for("Hello World Title").unwrap());
        assert_eq!(slug_for("Rust, Axum & SQLite!").unwrap(), "rust-axum-sqlite");
        assert!(matches!(slug_for("!!!!!"), Err(ApiError::Validation(_))));
    }

    #[test]
    fn create_then_fetch_by_slug() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");

        let created = create_article(&state.db, &alice, req("Hello World Title")).unwrap();
        assert_eq!(created.slug, "hello-world-title");
        assert_eq!(created.author, alice.id);
        assert_eq!(created.tags, vec!["rust", "web"]);
        assert_eq!(created.tags_count, 2);
        assert_eq!(created.favourites_count, 0);
        assert!(created.comments.is_empty());

        let fetched = get_by_slug(&state.db, "hello-world-title").unwrap();
        assert_eq!(fetched.id, created.id);

        let profile = crate::profiles::get_profile(&state.db, "alice").unwrap();
        assert_eq!(profile.my_articles, vec![created.id]);

        assert!(matches!(get_by_slug(&state.db, "missing"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn duplicate_titles_conflict() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");
        let bob = test_support::user(&state, "bob");

        create_article(&state.db, &alice, req("Hello World Title")).unwrap();
        let err = create_article(&state.db, &bob, req("Hello World Title")).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // Different title, same slug
        let err = create_article(&state.db, &bob, req("hello world title!")).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn listing_pages_newest_first() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");
        for i in 0..12 {
            create_article(&state.db, &alice, req(&format!("Article number {i}"))).unwrap();
        }

        let first = list_articles(&state.db, Pagination::first()).unwrap();
        assert_eq!((first.page, first.count), (1, 10));
        assert_eq!(first.data[0].title, "Article number 11");

        let second = list_articles(&state.db, Pagination::new(Some(2)).unwrap()).unwrap();
        assert_eq!(second.count, 2);
        assert_eq!(second.data[1].title, "Article number 0");

        let beyond = list_articles(&state.db, Pagination::new(Some(5)).unwrap()).unwrap();
        assert_eq!((beyond.page, beyond.count), (5, 0));
        assert!(beyond.data.is_empty());
    }

    #[test]
    fn retitling_recomputes_slug() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");
        let created = create_article(&state.db, &alice, req("Hello World Title")).unwrap();

        let change = UpdateArticleRequest {
            title: Some("Goodbye Cruel World".into()),
            ..Default::default()
        };
        let updated = update_article(&state.db, &alice, created.id, change).unwrap();
        assert_eq!(updated.slug, "goodbye-cruel-world");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.description, created.description);

        assert!(get_by_slug(&state.db, "hello-world-title").is_err());
        assert_eq!(get_by_slug(&state.db, "goodbye-cruel-world").unwrap().id, created.id);

        // Keeping your own title is not a clash
        let same = UpdateArticleRequest {
            title: Some("Goodbye Cruel World".into()),
            ..Default::default()
        };
        assert!(update_article(&state.db, &alice, created.id, same).is_ok());
    }

    #[test]
    fn retitling_onto_another_article_conflicts() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");
        create_article(&state.db, &alice, req("First Article")).unwrap();
        let second = create_article(&state.db, &alice, req("Second Article")).unwrap();

        let change = UpdateArticleRequest {
            title: Some("First Article".into()),
            ..Default::default()
        };
        let err = update_article(&state.db, &alice, second.id, change).unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(get_by_slug(&state.db, "second-article").unwrap().title, "Second Article");
    }

    #[test]
    fn only_the_author_may_update() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");
        let bob = test_support::user(&state, "bob");
        let created = create_article(&state.db, &alice, req("Hello World Title")).unwrap();

        let change = UpdateArticleRequest {
            body: Some("Vandalised body".into()),
            ..Default::default()
        };
        let err = update_article(&state.db, &bob, created.id, change).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn delete_by_non_owner_changes_nothing() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");
        let bob = test_support::user(&state, "bob");
        let created = create_article(&state.db, &alice, req("Hello World Title")).unwrap();
        comment_store::add_comment(
            &state.db,
            &bob,
            created.id,
            CreateCommentRequest { text: "Great read".into() },
        )
        .unwrap();

        let err = delete_article(&state.db, &bob, created.id).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let still_there = get_by_slug(&state.db, "hello-world-title").unwrap();
        assert_eq!(still_there.comments.len(), 1);
    }

    #[test]
    fn owner_delete_cascades() {
        let state = test_support::state();
        let alice = test_support::user(&state, "alice");
        let bob = test_support::user(&state, "bob");
        let created = create_article(&state.db, &alice, req("Hello World Title")).unwrap();
        crate::graph::favourite(&state.db, &bob, created.id).unwrap();
        comment_store::add_comment(
            &state.db,
            &bob,
            created.id,
            CreateCommentRequest { text: "Great read".into() },
        )
        .unwrap();

        delete_article(&state.db, &alice, created.id).unwrap();

        assert!(matches!(get_by_slug(&state.db, "hello-world-title"), Err(ApiError::NotFound(_))));
        assert!(crate::profiles::get_profile(&state.db, "alice").unwrap().my_articles.is_empty());
        assert!(crate::profiles::get_profile(&state.db, "bob").unwrap().favourites.is_empty());
        assert!(matches!(
            delete_article(&state.db, &alice, created.id),
            Err(ApiError::NotFound(_))
        ));
    }
}
