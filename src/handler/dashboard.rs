use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Router, middleware};
use tracing::instrument;

use crate::AppState;
use crate::db::{DashboardExt, PostExt, ProjectExt};
use crate::dtos::{ApiResponse, DashboardDto};
use crate::error::{HttpError, db_error};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;

const RECENT_ITEMS: i64 = 5;

pub fn dashboard_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route(
        "/",
        get(get_dashboard)
            .route_layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
            }))
            .route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

#[instrument(skip(app_state))]
pub async fn get_dashboard(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let db = &app_state.db_client;

    let (stats, recent_posts, recent_projects, recent_feedback) = tokio::try_join!(
        async {
            db.get_dashboard_stats()
                .await
                .map_err(db_error("dashboard_stats", "thống kê"))
        },
        async {
            db.get_posts(1, RECENT_ITEMS, None)
                .await
                .map_err(db_error("dashboard_posts", "bài viết"))
        },
        async {
            db.get_projects(1, RECENT_ITEMS, None)
                .await
                .map_err(db_error("dashboard_projects", "dự án"))
        },
        async {
            db.get_recent_feedback(RECENT_ITEMS)
                .await
                .map_err(db_error("dashboard_feedback", "góp ý"))
        },
    )?;

    Ok(Json(ApiResponse::ok(DashboardDto {
        stats,
        recent_posts,
        recent_projects,
        recent_feedback,
    })))
}
