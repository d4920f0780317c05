use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use chrono::Utc;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::{ProjectExt, ProjectFields};
use crate::dtos::{ApiResponse, InputProjectDto, ListData, PaginationDto, ProjectListQuery};
use crate::error::{HttpError, db_error};
use crate::extract::{Json, Path, Query};
use crate::handler::post::{publish_stamp, slug_for};
use crate::middleware::{auth, role_check};
use crate::models::{ProjectStatus, UserRole};
use crate::utils::content;

const DEFAULT_LIMIT: i64 = 20;

pub fn project_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_projects))
        .route(
            "/",
            post(create_project)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route("/{project_id}", get(get_project))
        .route(
            "/{project_id}",
            put(edit_project)
                .delete(delete_project)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

#[instrument(skip(app_state))]
pub async fn get_projects(
    Query(params): Query<ProjectListQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(HttpError::validation)?;

    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    let projects = app_state
        .db_client
        .get_projects(page, limit, params.status)
        .await
        .map_err(db_error("get_projects", "dự án"))?;

    let total = app_state
        .db_client
        .get_project_count(params.status)
        .await
        .map_err(db_error("get_project_count", "dự án"))?;

    Ok(Json(ApiResponse::ok(ListData {
        items: projects,
        pagination: PaginationDto::new(page, limit, total),
    })))
}

#[instrument(skip(app_state))]
pub async fn get_project(
    Path(project_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let project = app_state
        .db_client
        .get_project(project_id)
        .await
        .map_err(db_error("get_project", "dự án"))?;

    Ok(Json(ApiResponse::ok(project)))
}

struct CleanProject {
    slug: String,
    description: Option<String>,
    content: Option<String>,
    cover_image: Option<String>,
    pdf_file: Option<String>,
}

fn clean(body: InputProjectDto) -> Result<(InputProjectDto, CleanProject), HttpError> {
    let slug = slug_for(&body.title)?;
    let cleaned = CleanProject {
        slug,
        description: content::non_empty(body.description.clone()),
        content: content::sanitize_optional_html(body.content.as_deref()),
        cover_image: content::non_empty(body.cover_image.clone()),
        pdf_file: content::non_empty(body.pdf_file.clone()),
    };
    Ok((body, cleaned))
}

#[instrument(skip(app_state, body), fields(title = %body.title))]
pub async fn create_project(
    State(app_state): State<AppState>,
    Json(body): Json<InputProjectDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::warn!("Invalid project input: {}", e);
        HttpError::validation(e)
    })?;

    let (body, cleaned) = clean(body)?;
    let published_at = publish_stamp(body.status == ProjectStatus::Published, Utc::now());

    let project = app_state
        .db_client
        .create_project(
            ProjectFields {
                title: &body.title,
                slug: &cleaned.slug,
                description: cleaned.description.as_deref(),
                content: cleaned.content.as_deref(),
                cover_image: cleaned.cover_image.as_deref(),
                pdf_file: cleaned.pdf_file.as_deref(),
                category_id: body.category_id,
                status: body.status,
            },
            published_at,
        )
        .await
        .map_err(db_error("create_project", "dự án"))?;

    tracing::info!(project_id = project.id, "Project created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(project, "Tạo dự án thành công")),
    ))
}

#[instrument(skip(app_state, body))]
pub async fn edit_project(
    Path(project_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(body): Json<InputProjectDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::warn!("Invalid project input: {}", e);
        HttpError::validation(e)
    })?;

    let (body, cleaned) = clean(body)?;
    let published_at = publish_stamp(body.status == ProjectStatus::Published, Utc::now());

    let project = app_state
        .db_client
        .update_project(
            project_id,
            ProjectFields {
                title: &body.title,
                slug: &cleaned.slug,
                description: cleaned.description.as_deref(),
                content: cleaned.content.as_deref(),
                cover_image: cleaned.cover_image.as_deref(),
                pdf_file: cleaned.pdf_file.as_deref(),
                category_id: body.category_id,
                status: body.status,
            },
            published_at,
        )
        .await
        .map_err(db_error("update_project", "dự án"))?;

    tracing::info!(project_id, "Project updated");
    Ok(Json(ApiResponse::with_message(project, "Cập nhật dự án thành công")))
}

#[instrument(skip(app_state))]
pub async fn delete_project(
    Path(project_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_project(project_id)
        .await
        .map_err(db_error("delete_project", "dự án"))?;

    tracing::info!(project_id, "Project deleted");
    Ok(Json(ApiResponse::message("Xóa dự án thành công")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optionals_become_null_and_content_is_sanitized() {
        let body: InputProjectDto = serde_json::from_str(
            r#"{"title":"Quy hoạch vùng Đồng bằng sông Hồng","description":"  ","content":"<p>ok</p><script>x()</script>","pdf_file":""}"#,
        )
        .unwrap();

        let (_, cleaned) = clean(body).unwrap();
        assert_eq!(cleaned.slug, "quy-hoach-vung-dong-bang-song-hong");
        assert_eq!(cleaned.description, None);
        assert_eq!(cleaned.pdf_file, None);
        assert_eq!(cleaned.content.as_deref(), Some("<p>ok</p>"));
    }
}
