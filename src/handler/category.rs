use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::{CategoryExt, CategoryFields};
use crate::dtos::{ApiResponse, InputCategoryDto};
use crate::error::{ErrorMessage, HttpError, db_error};
use crate::extract::{Json, Path};
use crate::handler::post::slug_for;
use crate::middleware::{auth, role_check};
use crate::models::UserRole;
use crate::utils::content;

pub fn category_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_categories))
        .route(
            "/",
            post(create_category)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{category_id}", get(get_category))
        .route(
            "/{category_id}",
            put(edit_category)
                .delete(delete_category)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// A category may not name itself as its parent.
pub fn ensure_not_own_parent(category_id: i64, parent_id: Option<i64>) -> Result<(), HttpError> {
    if parent_id == Some(category_id) {
        return Err(HttpError::bad_request(
            ErrorMessage::CategoryOwnParent.to_string(),
        ));
    }
    Ok(())
}

#[instrument(skip(app_state))]
pub async fn get_categories(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let categories = app_state
        .db_client
        .get_categories()
        .await
        .map_err(db_error("get_categories", "danh mục"))?;

    Ok(Json(ApiResponse::ok(categories)))
}

#[instrument(skip(app_state))]
pub async fn get_category(
    Path(category_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let category = app_state
        .db_client
        .get_category(category_id)
        .await
        .map_err(db_error("get_category", "danh mục"))?;

    Ok(Json(ApiResponse::ok(category)))
}

#[instrument(skip(app_state, body), fields(name = %body.name))]
pub async fn create_category(
    State(app_state): State<AppState>,
    Json(body): Json<InputCategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let slug = slug_for(&body.name)?;
    let description = content::non_empty(body.description);

    let category = app_state
        .db_client
        .create_category(CategoryFields {
            name: &body.name,
            slug: &slug,
            description: description.as_deref(),
            parent_id: body.parent_id,
            display_order: body.display_order,
        })
        .await
        .map_err(db_error("create_category", "danh mục"))?;

    tracing::info!(category_id = category.id, "Category created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(category, "Tạo danh mục thành công")),
    ))
}

#[instrument(skip(app_state, body))]
pub async fn edit_category(
    Path(category_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<InputCategoryDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;
    ensure_not_own_parent(category_id, body.parent_id)?;

    let slug = slug_for(&body.name)?;
    let description = content::non_empty(body.description);

    let category = app_state
        .db_client
        .update_category(
            category_id,
            CategoryFields {
                name: &body.name,
                slug: &slug,
                description: description.as_deref(),
                parent_id: body.parent_id,
                display_order: body.display_order,
            },
        )
        .await
        .map_err(db_error("update_category", "danh mục"))?;

    tracing::info!(category_id, "Category updated");
    Ok(Json(ApiResponse::with_message(category, "Cập nhật danh mục thành công")))
}

#[instrument(skip(app_state))]
pub async fn delete_category(
    Path(category_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_category(category_id)
        .await
        .map_err(db_error("delete_category", "danh mục"))?;

    tracing::info!(category_id, "Category deleted");
    Ok(Json(ApiResponse::message("Xóa danh mục thành công")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_parent_is_rejected() {
        let err = ensure_not_own_parent(7, Some(7)).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(ensure_not_own_parent(7, Some(3)).is_ok());
        assert!(ensure_not_own_parent(7, None).is_ok());
    }
}
