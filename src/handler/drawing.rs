use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::{DrawingExt, DrawingFields};
use crate::dtos::{ApiResponse, DrawingListQuery, InputDrawingDto, ListData, PaginationDto};
use crate::error::{HttpError, db_error};
use crate::extract::{Json, Path, Query};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;
use crate::utils::content::non_empty;

const DEFAULT_LIMIT: i64 = 10;

/// Drawing files are managed by administrators only.
pub fn drawing_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_drawings))
        .route(
            "/",
            post(create_drawing)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{drawing_id}", get(get_drawing))
        .route(
            "/{drawing_id}",
            put(edit_drawing)
                .delete(delete_drawing)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_drawings(
    Query(params): Query<DrawingListQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(HttpError::validation)?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let drawings = app_state
        .db_client
        .get_drawings(page, limit, params.status)
        .await
        .map_err(db_error("get_drawings", "bản vẽ"))?;

    let total = app_state
        .db_client
        .get_drawing_count(params.status)
        .await
        .map_err(db_error("get_drawing_count", "bản vẽ"))?;

    Ok(Json(ApiResponse::ok(ListData {
        items: drawings,
        pagination: PaginationDto::new(page, limit, total),
    })))
}

#[instrument(skip(app_state))]
pub async fn get_drawing(
    Path(drawing_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let drawing = app_state
        .db_client
        .get_drawing(drawing_id)
        .await
        .map_err(db_error("get_drawing", "bản vẽ"))?;

    Ok(Json(ApiResponse::ok(drawing)))
}

#[instrument(skip(app_state, body), fields(title = %body.title))]
pub async fn create_drawing(
    State(app_state): State<AppState>,
    Json(body): Json<InputDrawingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let icon = non_empty(body.icon);

    let drawing = app_state
        .db_client
        .create_drawing(DrawingFields {
            title: &body.title,
            dwg_file: &body.dwg_file,
            icon: icon.as_deref(),
            status: body.status,
            display_order: body.display_order,
        })
        .await
        .map_err(db_error("create_drawing", "bản vẽ"))?;

    tracing::info!(drawing_id = drawing.id, "Drawing created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(drawing, "Thêm bản vẽ thành công")),
    ))
}

#[instrument(skip(app_state, body))]
pub async fn edit_drawing(
    Path(drawing_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<InputDrawingDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let icon = non_empty(body.icon);

    let drawing = app_state
        .db_client
        .update_drawing(
            drawing_id,
            DrawingFields {
                title: &body.title,
                dwg_file: &body.dwg_file,
                icon: icon.as_deref(),
                status: body.status,
                display_order: body.display_order,
            },
        )
        .await
        .map_err(db_error("update_drawing", "bản vẽ"))?;

    Ok(Json(ApiResponse::with_message(drawing, "Cập nhật bản vẽ thành công")))
}

#[instrument(skip(app_state))]
pub async fn delete_drawing(
    Path(drawing_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_drawing(drawing_id)
        .await
        .map_err(db_error("delete_drawing", "bản vẽ"))?;

    tracing::info!(drawing_id, "Drawing deleted");
    Ok(Json(ApiResponse::message("Xóa bản vẽ thành công")))
}
