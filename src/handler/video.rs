use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::{VideoExt, VideoFields};
use crate::dtos::{ApiResponse, InputVideoDto};
use crate::error::{HttpError, db_error};
use crate::extract::{Json, Path};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;
use crate::utils::content::non_empty;

pub fn video_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_videos))
        .route(
            "/",
            post(create_video)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{video_id}", get(get_video))
        .route(
            "/{video_id}",
            put(edit_video)
                .delete(delete_video)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_videos(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let videos = app_state
        .db_client
        .get_videos()
        .await
        .map_err(db_error("get_videos", "video"))?;

    Ok(Json(ApiResponse::ok(videos)))
}

#[instrument(skip(app_state))]
pub async fn get_video(
    Path(video_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let video = app_state
        .db_client
        .get_video(video_id)
        .await
        .map_err(db_error("get_video", "video"))?;

    Ok(Json(ApiResponse::ok(video)))
}

#[instrument(skip(app_state, body), fields(title = %body.title))]
pub async fn create_video(
    State(app_state): State<AppState>,
    Json(body): Json<InputVideoDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let description = non_empty(body.description);
    let thumbnail_url = non_empty(body.thumbnail_url);
    let duration = non_empty(body.duration);

    let video = app_state
        .db_client
        .create_video(VideoFields {
            title: &body.title,
            description: description.as_deref(),
            video_url: &body.video_url,
            thumbnail_url: thumbnail_url.as_deref(),
            duration: duration.as_deref(),
            display_order: body.display_order,
            status: body.status,
        })
        .await
        .map_err(db_error("create_video", "video"))?;

    tracing::info!(video_id = video.id, "Video created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(video, "Thêm video thành công")),
    ))
}

#[instrument(skip(app_state, body))]
pub async fn edit_video(
    Path(video_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<InputVideoDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let description = non_empty(body.description);
    let thumbnail_url = non_empty(body.thumbnail_url);
    let duration = non_empty(body.duration);

    let video = app_state
        .db_client
        .update_video(
            video_id,
            VideoFields {
                title: &body.title,
                description: description.as_deref(),
                video_url: &body.video_url,
                thumbnail_url: thumbnail_url.as_deref(),
                duration: duration.as_deref(),
                display_order: body.display_order,
                status: body.status,
            },
        )
        .await
        .map_err(db_error("update_video", "video"))?;

    Ok(Json(ApiResponse::with_message(video, "Cập nhật video thành công")))
}

#[instrument(skip(app_state))]
pub async fn delete_video(
    Path(video_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_video(video_id)
        .await
        .map_err(db_error("delete_video", "video"))?;

    tracing::info!(video_id, "Video deleted");
    Ok(Json(ApiResponse::message("Xóa video thành công")))
}
