use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use quill_db::models::{CommentRow, decode_id, decode_time, encode_time};
use quill_db::{Database, articles, comments, users};
use quill_types::api::CreateCommentRequest;
use quill_types::models::Comment;

use crate::articles::not_found as article_not_found;
use crate::error::ApiError;
use crate::extract::{ValidatedJson, parse_id, reply};
use crate::middleware::CurrentUser;
use crate::state::{AppState, blocking};

pub async fn index(
    State(state): State<AppState>,
    Path(article): Path<String>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id = parse_id(&article, "Article")?;
    let comments = blocking(&state, move |s| list_comments(&s.db, article_id)).await?;
    Ok(reply(StatusCode::OK, "success", comments))
}

pub async fn create(
    State(state): State<AppState>,
    Path(article): Path<String>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id = parse_id(&article, "Article")?;
    let comment = blocking(&state, move |s| add_comment(&s.db, &user, article_id, req)).await?;
    Ok(reply(StatusCode::CREATED, "Comment added!", comment))
}

/// `DELETE /articles/comments/{comment}`
pub async fn destroy(
    State(state): State<AppState>,
    Path(comment): Path<String>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let comment_id = parse_id(&comment, "Comment")?;
    blocking(&state, move |s| delete_comment(&s.db, &user, comment_id, None)).await?;
    Ok(reply(StatusCode::OK, "Comment deleted", comment_id))
}

/// `DELETE /articles/{article}/comments/{comment}`
pub async fn destroy_on_article(
    State(state): State<AppState>,
    Path((article, comment)): Path<(String, String)>,
    Extension(user): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let article_id = parse_id(&article, "Article")?;
    let comment_id = parse_id(&comment, "Comment")?;
    blocking(&state, move |s| {
        delete_comment(&s.db, &user, comment_id, Some(article_id))
    })
    .await?;
    Ok(reply(StatusCode::OK, "Comment deleted", comment_id))
}

fn comment_not_found() -> ApiError {
    ApiError::NotFound("Comment not found".into())
}

pub fn add_comment(
    db: &Database,
    actor: &CurrentUser,
    article_id: Uuid,
    req: CreateCommentRequest,
) -> Result<Comment, ApiError> {
    let row = CommentRow {
        id: Uuid::new_v4().to_string(),
        text: req.text.trim().to_string(),
        user_id: actor.id.to_string(),
        article_id: article_id.to_string(),
        created_at: encode_time(Utc::now()),
    };

    let comment = db.with_tx(|tx| {
        if articles::find_by_id(tx, &row.article_id)?.is_none() {
            return Err(article_not_found());
        }
        if users::find_by_id(tx, &row.user_id)?.is_none() {
            return Err(ApiError::NotFound("User not found.".into()));
        }
        comments::insert(tx, &row)?;
        Ok(to_model(row)?)
    })?;

    info!(comment_id = %comment.id, %article_id, user = %actor.id, "Comment added");
    Ok(comment)
}

/// Comments on an article, oldest first.
pub fn list_comments(db: &Database, article_id: Uuid) -> Result<Vec<Comment>, ApiError> {
    db.with_conn(|conn| {
        let article_id = article_id.to_string();
        if articles::find_by_id(conn, &article_id)?.is_none() {
            return Err(article_not_found());
        }
        let rows = comments::list_for_article(conn, &article_id)?;
        Ok(rows
            .into_iter()
            .map(to_model)
            .collect::<anyhow::Result<Vec<_>>>()?)
    })
}

/// Permitted to the article's author or the comment's own author. When
/// `article_id` is given the comment must belong to that article.
pub fn delete_comment(
    db: &Database,
    actor: &CurrentUser,
    comment_id: Uuid,
    article_id: Option<Uuid>,
) -> Result<(), ApiError> {
    let actor_id = actor.id.to_string();

    db.with_tx(|tx| {
        let comment = comments::find_by_id(tx, &comment_id.to_string())?
            .ok_or_else(comment_not_found)?;
        if let Some(expected) = article_id {
            if comment.article_id != expected.to_string() {
                return Err(comment_not_found());
            }
        }

        let article = articles::find_by_id(tx, &comment.article_id)?.ok_or_else(article_not_found)?;
        if article.author_id != actor_id && comment.user_id != actor_id {
            return Err(ApiError::Unauthorized(
                "You're not allowed to delete this comment".into(),
            ));
        }

        comments::delete(tx, &comment.id)?;
        Ok(())
    })?;

    info!(%comment_id, user = %actor.id, "Comment deleted");
    Ok(())
}

fn to_model(row: CommentRow) -> anyhow::Result<Comment> {
    Ok(Comment {
        id: decode_id(&row.id)?,
        user: decode_id(&row.user_id)?,
        article: decode_id(&row.article_id)?,
        created_at: decode_time(&row.created_at)?,
        text: row.text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::articles::{create_article, get_by_slug};
    use crate::test_support;
    use quill_types::api::CreateArticleRequest;

    struct Fixture {
        state: crate::state::AppState,
        author: CurrentUser,
        commenter: CurrentUser,
        stranger: CurrentUser,
        article_id: Uuid,
    }

    fn fixture() -> Fixture {
        let state = test_support::state();
        let author = test_support::user(&state, "alice");
        let commenter = test_support::user(&state, "bob");
        let stranger = test_support::user(&state, "carol");
        let article = create_article(
            &state.db,
            &author,
            CreateArticleRequest {
                title: "Hello World Title".into(),
                description: "A short description".into(),
                body: "The body of the article".into(),
                tags: vec![],
            },
        )
        .unwrap();
        Fixture {
            state,
            author,
            commenter,
            stranger,
            article_id: article.id,
        }
    }

    fn text(t: &str) -> CreateCommentRequest {
        CreateCommentRequest { text: t.into() }
    }

    #[test]
    fn comments_attach_to_their_article_in_order() {
        let f = fixture();
        let first = add_comment(&f.state.db, &f.commenter, f.article_id, text("First!")).unwrap();
        let second = add_comment(&f.state.db, &f.author, f.article_id, text("Thanks")).unwrap();
        assert_eq!(first.user, f.commenter.id);
        assert_eq!(first.article, f.article_id);

        let article = get_by_slug(&f.state.db, "hello-world-title").unwrap();
        assert_eq!(article.comments, vec![first.id, second.id]);

        let listed: Vec<Uuid> = list_comments(&f.state.db, f.article_id)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(listed, vec![first.id, second.id]);
    }

    #[test]
    fn commenting_on_a_missing_article_fails() {
        let f = fixture();
        let err = add_comment(&f.state.db, &f.commenter, Uuid::new_v4(), text("Hello?")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(matches!(list_comments(&f.state.db, Uuid::new_v4()), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn comment_author_and_article_author_may_delete() {
        let f = fixture();
        let own = add_comment(&f.state.db, &f.commenter, f.article_id, text("Mine")).unwrap();
        let other = add_comment(&f.state.db, &f.commenter, f.article_id, text("Also mine")).unwrap();

        delete_comment(&f.state.db, &f.commenter, own.id, None).unwrap();
        delete_comment(&f.state.db, &f.author, other.id, Some(f.article_id)).unwrap();

        let article = get_by_slug(&f.state.db, "hello-world-title").unwrap();
        assert!(article.comments.is_empty());
    }

    #[test]
    fn strangers_may_not_delete() {
        let f = fixture();
        let comment = add_comment(&f.state.db, &f.commenter, f.article_id, text("Mine")).unwrap();

        let err = delete_comment(&f.state.db, &f.stranger, comment.id, None).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert_eq!(list_comments(&f.state.db, f.article_id).unwrap().len(), 1);
    }

    #[test]
    fn delete_checks_the_comment_belongs_to_the_article() {
        let f = fixture();
        let comment = add_comment(&f.state.db, &f.commenter, f.article_id, text("Mine")).unwrap();

        let err = delete_comment(&f.state.db, &f.commenter, comment.id, Some(Uuid::new_v4())).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        delete_comment(&f.state.db, &f.commenter, comment.id, None).unwrap();
        let err = delete_comment(&f.state.db, &f.commenter, comment.id, None).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
