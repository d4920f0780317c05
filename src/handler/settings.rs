use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::SettingExt;
use crate::dtos::{ApiResponse, UpdateSettingsDto};
use crate::error::{HttpError, db_error};
use crate::extract::{Json, Path};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;

pub fn settings_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route("/", get(get_settings)).route(
        "/{setting_id}",
        put(update_settings)
            .route_layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin])
            }))
            .route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

#[instrument(skip(app_state))]
pub async fn get_settings(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let settings = app_state
        .db_client
        .get_settings()
        .await
        .map_err(db_error("get_settings", "cài đặt"))?;

    Ok(Json(ApiResponse::ok(settings)))
}

#[instrument(skip(app_state, body))]
pub async fn update_settings(
    Path(setting_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<UpdateSettingsDto>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.trimmed();
    body.validate().map_err(HttpError::validation)?;

    let settings = app_state
        .db_client
        .update_settings(setting_id, &body)
        .await
        .map_err(db_error("update_settings", "cài đặt"))?;

    tracing::info!(setting_id, "Settings updated");
    Ok(Json(ApiResponse::with_message(settings, "Cập nhật cài đặt thành công")))
}
