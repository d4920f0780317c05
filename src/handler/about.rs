use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::AboutExt;
use crate::dtos::{ApiResponse, InputAboutDto};
use crate::error::{HttpError, db_error};
use crate::extract::{Json, Path};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;
use crate::utils::content::{non_empty, sanitize_html};

pub fn about_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_about_list))
        .route(
            "/",
            post(create_about)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{about_id}", get(get_about))
        .route(
            "/{about_id}",
            put(edit_about)
                .delete(delete_about)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_about_list(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let about = app_state
        .db_client
        .get_about_list()
        .await
        .map_err(db_error("get_about_list", "nội dung giới thiệu"))?;

    Ok(Json(ApiResponse::ok(about)))
}

#[instrument(skip(app_state))]
pub async fn get_about(
    Path(about_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let about = app_state
        .db_client
        .get_about(about_id)
        .await
        .map_err(db_error("get_about", "nội dung giới thiệu"))?;

    Ok(Json(ApiResponse::ok(about)))
}

#[instrument(skip(app_state, body))]
pub async fn create_about(
    State(app_state): State<AppState>,
    Json(body): Json<InputAboutDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let content = sanitize_html(&body.content);
    let image_url = non_empty(body.image_url);

    let about = app_state
        .db_client
        .create_about(&content, image_url.as_deref())
        .await
        .map_err(db_error("create_about", "nội dung giới thiệu"))?;

    tracing::info!(about_id = about.id, "About content created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(about, "Tạo nội dung giới thiệu thành công")),
    ))
}

#[instrument(skip(app_state, body))]
pub async fn edit_about(
    Path(about_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<InputAboutDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let content = sanitize_html(&body.content);
    let image_url = non_empty(body.image_url);

    let about = app_state
        .db_client
        .update_about(about_id, &content, image_url.as_deref())
        .await
        .map_err(db_error("update_about", "nội dung giới thiệu"))?;

    Ok(Json(ApiResponse::with_message(about, "Cập nhật nội dung giới thiệu thành công")))
}

#[instrument(skip(app_state))]
pub async fn delete_about(
    Path(about_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_about(about_id)
        .await
        .map_err(db_error("delete_about", "nội dung giới thiệu"))?;

    tracing::info!(about_id, "About content deleted");
    Ok(Json(ApiResponse::message("Xóa nội dung giới thiệu thành công")))
}
