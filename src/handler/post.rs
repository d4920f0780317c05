use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Router, middleware};
use chrono::{DateTime, Utc};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::{PostExt, PostFields};
use crate::dtos::{ApiResponse, InputPostDto, ListData, PaginationDto, PostListQuery};
use crate::error::{ErrorMessage, HttpError, db_error};
use crate::extract::{Json, Path, Query};
use crate::middleware::{AuthSession, auth, role_check};
use crate::models::{PostStatus, UserRole};
use crate::utils::{content, slug::create_slug};

const DEFAULT_LIMIT: i64 = 20;

pub fn post_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_posts))
        .route(
            "/",
            post(create_post)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{post_id}", get(get_post))
        .route(
            "/{post_id}",
            put(edit_post)
                .delete(delete_post)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// The `published_at` value to write: `now` when the row is being published.
///
/// Paired with `COALESCE(published_at, $stamp)` on update, a row keeps the
/// date of its first publication.
pub fn publish_stamp(publishing: bool, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    publishing.then_some(now)
}

/// Slug for a title, rejecting titles with no usable characters.
pub fn slug_for(title: &str) -> Result<String, HttpError> {
    let slug = create_slug(title);
    if slug.is_empty() {
        return Err(HttpError::bad_request(ErrorMessage::InvalidData.to_string()));
    }
    Ok(slug)
}

#[instrument(skip(app_state))]
pub async fn get_posts(
    Query(params): Query<PostListQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(HttpError::validation)?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let posts = app_state
        .db_client
        .get_posts(page, limit, params.status)
        .await
        .map_err(db_error("get_posts", "bài viết"))?;

    let total = app_state
        .db_client
        .get_post_count(params.status)
        .await
        .map_err(db_error("get_post_count", "bài viết"))?;

    Ok(Json(ApiResponse::ok(ListData {
        items: posts,
        pagination: PaginationDto::new(page, limit, total),
    })))
}

#[instrument(skip(app_state))]
pub async fn get_post(
    Path(post_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let post = app_state
        .db_client
        .get_post(post_id)
        .await
        .map_err(db_error("get_post", "bài viết"))?;

    Ok(Json(ApiResponse::ok(post)))
}

#[instrument(skip(app_state, session, body), fields(user_id = session.user.id, title = %body.title))]
pub async fn create_post(
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<InputPostDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::warn!("Invalid post input: {}", e);
        HttpError::validation(e)
    })?;

    let slug = slug_for(&body.title)?;
    let html = content::sanitize_html(&body.content);
    let excerpt = content::non_empty(body.excerpt);
    let cover_image = content::non_empty(body.cover_image);

    let published_at = publish_stamp(body.status == PostStatus::Published, Utc::now());

    let post = app_state
        .db_client
        .create_post(
            session.user.id,
            PostFields {
                title: &body.title,
                slug: &slug,
                content: &html,
                excerpt: excerpt.as_deref(),
                cover_image: cover_image.as_deref(),
                category_id: body.category_id,
                status: body.status,
            },
            published_at,
        )
        .await
        .map_err(db_error("create_post", "bài viết"))?;

    tracing::info!(post_id = post.id, "Post created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(post, "Tạo bài viết thành công")),
    ))
}

#[instrument(skip(app_state, session, body), fields(user_id = session.user.id))]
pub async fn edit_post(
    Path(post_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<InputPostDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::warn!("Invalid post input: {}", e);
        HttpError::validation(e)
    })?;

    let slug = slug_for(&body.title)?;
    let html = content::sanitize_html(&body.content);
    let excerpt = content::non_empty(body.excerpt);
    let cover_image = content::non_empty(body.cover_image);

    let published_at = publish_stamp(body.status == PostStatus::Published, Utc::now());

    let post = app_state
        .db_client
        .update_post(
            post_id,
            PostFields {
                title: &body.title,
                slug: &slug,
                content: &html,
                excerpt: excerpt.as_deref(),
                cover_image: cover_image.as_deref(),
                category_id: body.category_id,
                status: body.status,
            },
            published_at,
        )
        .await
        .map_err(db_error("update_post", "bài viết"))?;

    tracing::info!(post_id, "Post updated");
    Ok(Json(ApiResponse::with_message(post, "Cập nhật bài viết thành công")))
}

#[instrument(skip(app_state, session), fields(user_id = session.user.id))]
pub async fn delete_post(
    Path(post_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_post(post_id)
        .await
        .map_err(db_error("delete_post", "bài viết"))?;

    tracing::info!(post_id, "Post deleted");
    Ok(Json(ApiResponse::message("Xóa bài viết thành công")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn drafts_carry_no_publish_date() {
        assert_eq!(publish_stamp(false, Utc::now()), None);
    }

    #[test]
    fn publishing_stamps_now() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(publish_stamp(true, now), Some(now));
    }

    #[test]
    fn symbol_only_titles_are_rejected() {
        assert_eq!(slug_for("!!! ???").unwrap_err().status, StatusCode::BAD_REQUEST);
        assert_eq!(slug_for("Quy hoạch Hà Nội").unwrap(), "quy-hoach-ha-noi");
    }
}
