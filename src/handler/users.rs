use crate::{
    AppState,
    db::{UserExt, UserFields},
    dtos::{ApiResponse, CreateUserDto, FilterUserDto, UpdateUserDto},
    error::{ErrorMessage, HttpError, db_error},
    extract::{Json, Path},
    middleware::{AuthSession, role_check},
    models::UserRole,
    utils::{content::non_empty, password},
};
use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;
use validator::Validate;

/// Router for account management.
///
/// The auth middleware is applied in routes.rs; every route here is admin-only.
pub fn users_handler() -> Router<AppState> {
    Router::new()
        .route("/", get(get_users).post(create_user))
        .route(
            "/{user_id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Admin])
        }))
}

/// Administrators cannot remove the account they are signed in with.
pub fn ensure_not_self(session_user_id: i64, target_id: i64) -> Result<(), HttpError> {
    if session_user_id == target_id {
        return Err(HttpError::bad_request(
            ErrorMessage::CannotDeleteSelf.to_string(),
        ));
    }
    Ok(())
}

fn hash_password(raw: &str) -> Result<String, HttpError> {
    password::hash(raw).map_err(|e| match e {
        // The byte limit can trip on accented input that passed the character check.
        ErrorMessage::EmptyPassword | ErrorMessage::ExceededMaxPasswordLength(_) => {
            HttpError::bad_request(e.to_string())
        }
        _ => {
            tracing::error!("Password hashing error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    })
}

fn lookup_failed(e: sqlx::Error) -> HttpError {
    tracing::error!("DB error, checking user uniqueness: {}", e);
    HttpError::server_error(ErrorMessage::ServerError.to_string())
}

#[instrument(skip(app_state))]
pub async fn get_users(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let users = app_state
        .db_client
        .get_users()
        .await
        .map_err(db_error("get_users", "người dùng"))?;

    Ok(Json(ApiResponse::ok(FilterUserDto::filter_users(&users))))
}

#[instrument(skip(app_state))]
pub async fn get_user(
    Path(user_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(db_error("get_user", "người dùng"))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::NotFound("người dùng").to_string()))?;

    Ok(Json(ApiResponse::ok(FilterUserDto::filter_user(&user))))
}

#[instrument(skip(app_state, body), fields(username = %body.username, email = %body.email))]
pub async fn create_user(
    State(app_state): State<AppState>,
    Json(mut body): Json<CreateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.password = non_empty(body.password);
    body.validate().map_err(|e| {
        tracing::warn!("Invalid user input: {}", e);
        HttpError::validation(e)
    })?;

    let raw_password = body
        .password
        .as_deref()
        .ok_or_else(|| HttpError::bad_request(ErrorMessage::PasswordRequired.to_string()))?;

    let username_taken = app_state
        .db_client
        .get_user(None, Some(&body.username), None)
        .await
        .map_err(lookup_failed)?
        .is_some();
    if username_taken {
        return Err(HttpError::bad_request(ErrorMessage::UsernameTaken.to_string()));
    }

    let email_taken = app_state
        .db_client
        .get_user(None, None, Some(&body.email))
        .await
        .map_err(lookup_failed)?
        .is_some();
    if email_taken {
        return Err(HttpError::bad_request(ErrorMessage::EmailTaken.to_string()));
    }

    let password_hash = hash_password(raw_password)?;
    let full_name = non_empty(body.full_name.clone());
    let avatar = non_empty(body.avatar.clone());

    let user = app_state
        .db_client
        .save_user(
            &body.username,
            &password_hash,
            UserFields {
                email: &body.email,
                full_name: full_name.as_deref(),
                avatar: avatar.as_deref(),
                role: body.role,
                status: body.status,
            },
        )
        .await
        .map_err(db_error("save_user", "người dùng"))?;

    tracing::info!(user_id = user.id, "User created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            FilterUserDto::filter_user(&user),
            "Tạo người dùng thành công",
        )),
    ))
}

#[instrument(skip(app_state, body))]
pub async fn update_user(
    Path(user_id): Path<i64>,
    State(app_state): State<AppState>,
    Json(mut body): Json<UpdateUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.password = non_empty(body.password);
    body.validate().map_err(|e| {
        tracing::warn!("Invalid user input: {}", e);
        HttpError::validation(e)
    })?;

    let email_taken = app_state
        .db_client
        .email_taken_by_other(user_id, &body.email)
        .await
        .map_err(lookup_failed)?;
    if email_taken {
        return Err(HttpError::bad_request(ErrorMessage::EmailTaken.to_string()));
    }

    let password_hash = match body.password.as_deref() {
        Some(raw) => Some(hash_password(raw)?),
        None => None,
    };
    let full_name = non_empty(body.full_name.clone());
    let avatar = non_empty(body.avatar.clone());

    let user = app_state
        .db_client
        .update_user(
            user_id,
            password_hash.as_deref(),
            UserFields {
                email: &body.email,
                full_name: full_name.as_deref(),
                avatar: avatar.as_deref(),
                role: body.role,
                status: body.status,
            },
        )
        .await
        .map_err(db_error("update_user", "người dùng"))?;

    tracing::info!(user_id, "User updated");
    Ok(Json(ApiResponse::with_message(
        FilterUserDto::filter_user(&user),
        "Cập nhật người dùng thành công",
    )))
}

#[instrument(skip(app_state, session), fields(admin_id = session.user.id))]
pub async fn delete_user(
    Path(user_id): Path<i64>,
    State(app_state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<impl IntoResponse, HttpError> {
    ensure_not_self(session.user.id, user_id)?;

    app_state
        .db_client
        .delete_user(user_id)
        .await
        .map_err(db_error("delete_user", "người dùng"))?;

    tracing::info!(user_id, "User deleted");
    Ok(Json(ApiResponse::message("Xóa người dùng thành công")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admins_cannot_delete_themselves() {
        let err = ensure_not_self(5, 5).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Không thể xóa tài khoản của chính mình");
    }

    #[test]
    fn deleting_someone_else_is_allowed() {
        assert!(ensure_not_self(5, 6).is_ok());
    }

    #[test]
    fn overlong_password_is_a_client_error() {
        // 40 characters, 120 bytes.
        let err = hash_password(&"ệ".repeat(40)).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Mật khẩu không được dài quá 64 ký tự");
        assert!(hash_password("matkhau123").is_ok());
    }
}
