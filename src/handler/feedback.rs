use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Extension, Router, middleware};
use chrono::{DateTime, Utc};
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::FeedbackExt;
use crate::dtos::{ApiResponse, CreateFeedbackDto, FeedbackListQuery, ReplyFeedbackDto};
use crate::error::{HttpError, db_error};
use crate::extract::{Json, Path, Query};
use crate::middleware::{AuthSession, auth, role_check};
use crate::models::{FeedbackStatus, UserRole};
use crate::utils::content::non_empty;

/// Anyone may submit; staff read; only administrators answer or delete.
pub fn feedback_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(create_feedback))
        .route(
            "/",
            get(get_feedback_list)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{feedback_id}",
            get(get_feedback)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
                }))
                .route_layer(middleware::from_fn_with_state(app_state.clone(), auth)),
        )
        .route(
            "/{feedback_id}",
            put(reply_feedback)
                .delete(delete_feedback)
                .route_layer(middleware::from_fn(|req, next| {
                    role_check(req, next, vec![UserRole::Admin])
                }))
                .route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// `(replied_at, replied_by)` to record for a reply.
///
/// Both are set only when there is a non-empty reply and the item is being
/// marked answered; `None` leaves the stored values untouched.
pub fn reply_stamp(
    admin_reply: Option<&str>,
    status: FeedbackStatus,
    replier_id: i64,
    now: DateTime<Utc>,
) -> (Option<DateTime<Utc>>, Option<i64>) {
    let has_reply = admin_reply.is_some_and(|r| !r.trim().is_empty());
    if has_reply && status == FeedbackStatus::Answered {
        (Some(now), Some(replier_id))
    } else {
        (None, None)
    }
}

#[instrument(skip(app_state, body), fields(email = %body.email))]
pub async fn create_feedback(
    State(app_state): State<AppState>,
    Json(body): Json<CreateFeedbackDto>,
) -> Result<impl IntoResponse, HttpError> {
    let body = body.trimmed();
    body.validate().map_err(|e| {
        tracing::warn!("Invalid feedback input: {}", e);
        HttpError::validation(e)
    })?;

    let feedback = app_state
        .db_client
        .create_feedback(
            &body.name,
            &body.email,
            body.phone.as_deref(),
            &body.subject,
            &body.message,
        )
        .await
        .map_err(db_error("create_feedback", "góp ý"))?;

    tracing::info!(feedback_id = feedback.id, "Feedback submitted");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            feedback,
            "Gửi góp ý thành công. Chúng tôi sẽ phản hồi sớm nhất có thể.",
        )),
    ))
}

#[instrument(skip(app_state))]
pub async fn get_feedback_list(
    Query(params): Query<FeedbackListQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let status = FeedbackStatus::from_filter(params.status.as_deref());

    let feedback = app_state
        .db_client
        .get_feedback_list(status)
        .await
        .map_err(db_error("get_feedback_list", "góp ý"))?;

    Ok(Json(ApiResponse::ok(feedback)))
}

#[instrument(skip(app_state))]
pub async fn get_feedback(
    Path(feedback_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let feedback = app_state
        .db_client
        .get_feedback(feedback_id)
        .await
        .map_err(db_error("get_feedback", "góp ý"))?;

    Ok(Json(ApiResponse::ok(feedback)))
}

#[instrument(skip(app_state, session, body), fields(user_id = session.user.id))]
pub async fn reply_feedback(
    Path(feedback_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(body): Json<ReplyFeedbackDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let admin_reply = non_empty(body.admin_reply);
    let (replied_at, replied_by) =
        reply_stamp(admin_reply.as_deref(), body.status, session.user.id, Utc::now());

    let feedback = app_state
        .db_client
        .reply_feedback(
            feedback_id,
            admin_reply.as_deref(),
            body.status,
            replied_at,
            replied_by,
        )
        .await
        .map_err(db_error("reply_feedback", "góp ý"))?;

    tracing::info!(feedback_id, status = ?feedback.status, "Feedback updated");
    Ok(Json(ApiResponse::with_message(feedback, "Cập nhật góp ý thành công")))
}

#[instrument(skip(app_state))]
pub async fn delete_feedback(
    Path(feedback_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .db_client
        .delete_feedback(feedback_id)
        .await
        .map_err(db_error("delete_feedback", "góp ý"))?;

    tracing::info!(feedback_id, "Feedback deleted");
    Ok(Json(ApiResponse::message("Xóa góp ý thành công")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answered_reply_is_stamped() {
        let now = Utc::now();
        assert_eq!(
            reply_stamp(Some("Đã tiếp nhận"), FeedbackStatus::Answered, 3, now),
            (Some(now), Some(3))
        );
    }

    #[test]
    fn blank_reply_leaves_stamps_alone() {
        let now = Utc::now();
        assert_eq!(reply_stamp(Some("   "), FeedbackStatus::Answered, 3, now), (None, None));
        assert_eq!(reply_stamp(None, FeedbackStatus::Answered, 3, now), (None, None));
    }

    #[test]
    fn archiving_with_reply_is_not_stamped() {
        let now = Utc::now();
        assert_eq!(
            reply_stamp(Some("Cảm ơn"), FeedbackStatus::Archived, 3, now),
            (None, None)
        );
    }
}
