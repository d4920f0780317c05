use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::{SlideExt, SlideFields};
use crate::dtos::{ApiResponse, InputSlideDto};
use crate::error::{HttpError, db_error};
use crate::extract::{Json, Path};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;
use crate::utils::content::non_empty;

pub fn slide_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_slides))
        .route(
            "/",
            post(create_slide)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{slide_id}", get(get_slide))
        .route(
            "/{slide_id}",
            put(edit_slide)
                .delete(delete_slide)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_slides(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let slides = app_state
        .db_client
        .get_slides()
        .await
        .map_err(db_error("get_slides", "slide"))?;

    Ok(Json(ApiResponse::ok(slides)))
}

#[instrument(skip(app_state))]
pub async fn get_slide(
    Path(slide_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let slide = app_state
        .db_client
        .get_slide(slide_id)
        .await
        .map_err(db_error("get_slide", "slide"))?;

    Ok(Json(ApiResponse::ok(slide)))
}

#[instrument(skip(app_state, body))]
pub async fn create_slide(
    State(app_state): State<AppState>,
    Json(body): Json<InputSlideDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let title = non_empty(body.title);
    let description = non_empty(body.description);
    let link_url = non_empty(body.link_url);

    let slide = app_state
        .db_client
        .create_slide(SlideFields {
            title: title.as_deref(),
            description: description.as_deref(),
            image_url: &body.image_url,
            link_url: link_url.as_deref(),
            display_order: body.display_order,
            is_active: body.is_active,
        })
        .await
        .map_err(db_error("create_slide", "slide"))?;

    tracing::info!(slide_id = slide.id, "Slide created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(slide, "Thêm slide thành công")),
    ))
}

#[instrument(skip(app_state, body))]
pub async fn edit_slide(
    Path(slide_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<InputSlideDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let title = non_empty(body.title);
    let description = non_empty(body.description);
    let link_url = non_empty(body.link_url);

    let slide = app_state
        .db_client
        .update_slide(
            slide_id,
            SlideFields {
                title: title.as_deref(),
                description: description.as_deref(),
                image_url: &body.image_url,
                link_url: link_url.as_deref(),
                display_order: body.display_order,
                is_active: body.is_active,
            },
        )
        .await
        .map_err(db_error("update_slide", "slide"))?;

    Ok(Json(ApiResponse::with_message(slide, "Cập nhật slide thành công")))
}

#[instrument(skip(app_state))]
pub async fn delete_slide(
    Path(slide_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_slide(slide_id)
        .await
        .map_err(db_error("delete_slide", "slide"))?;

    tracing::info!(slide_id, "Slide deleted");
    Ok(Json(ApiResponse::message("Xóa slide thành công")))
}
