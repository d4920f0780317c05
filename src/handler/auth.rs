use crate::{
    AppState,
    db::UserExt,
    dtos::{ApiResponse, FilterUserDto, LoginData, LoginUserDto},
    error::{ErrorMessage, HttpError},
    extract::Json,
    middleware::{ACCESS_TOKEN_COOKIE, AuthSession, auth},
    models::{ActiveStatus, User},
    utils::{password, token},
};
use axum::{
    Extension, Router, middleware,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::instrument;
use validator::Validate;

/// Router for `/api/auth`
pub fn auth_handler(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route(
            "/me",
            get(me).route_layer(middleware::from_fn_with_state(app_state, auth)),
        )
}

/// Only active back-office accounts may open a session.
pub fn may_sign_in(user: &User) -> bool {
    user.status == ActiveStatus::Active && user.role.can_sign_in()
}

fn session_cookie(token: String, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_seconds))
        .build()
}

/// Every login failure looks the same to the caller.
fn login_failed() -> HttpError {
    HttpError::unauthorized(ErrorMessage::InvalidCredentials.to_string())
}

#[instrument(skip(app_state, jar, body), fields(username = %body.username))]
pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(|e| {
        tracing::warn!("Invalid login input: {}", e);
        HttpError::validation(e)
    })?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.username), None)
        .await
        .map_err(|e| {
            tracing::error!("DB error, getting user: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| {
            tracing::warn!("Login for unknown username");
            login_failed()
        })?;

    let password_matched = password::compare(&body.password, &user.password_hash).map_err(|e| {
        tracing::error!("Password error: {}", e);
        login_failed()
    })?;

    if !password_matched {
        tracing::warn!("Password mismatch");
        return Err(login_failed());
    }

    if !may_sign_in(&user) {
        tracing::warn!(role = user.role.to_str(), "Account may not sign in");
        return Err(login_failed());
    }

    let access_token = token::create_token(
        user.id,
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(|e| {
        tracing::error!("Access token creation error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    })?;

    let jar = jar.add(session_cookie(
        access_token.clone(),
        app_state.env.jwt_maxage,
        app_state.env.cookie_secure,
    ));

    tracing::info!(user_id = user.id, "Login successful");
    Ok((
        jar,
        Json(ApiResponse::with_message(
            LoginData {
                user: FilterUserDto::filter_user(&user),
                access_token,
            },
            "Đăng nhập thành công",
        )),
    ))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"));
    (jar, Json(ApiResponse::message("Đăng xuất thành công")))
}

#[instrument(skip(session), fields(user_id = session.user.id))]
pub async fn me(Extension(session): Extension<AuthSession>) -> impl IntoResponse {
    Json(ApiResponse::ok(FilterUserDto::filter_user(&session.user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::Utc;

    fn user(role: UserRole, status: ActiveStatus) -> User {
        User {
            id: 1,
            username: "bientap".to_string(),
            email: "bientap@example.vn".to_string(),
            password_hash: String::new(),
            full_name: None,
            avatar: None,
            role,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn editors_and_admins_sign_in() {
        assert!(may_sign_in(&user(UserRole::Admin, ActiveStatus::Active)));
        assert!(may_sign_in(&user(UserRole::Editor, ActiveStatus::Active)));
    }

    #[test]
    fn plain_users_and_inactive_accounts_do_not() {
        assert!(!may_sign_in(&user(UserRole::User, ActiveStatus::Active)));
        assert!(!may_sign_in(&user(UserRole::Admin, ActiveStatus::Inactive)));
    }

    #[test]
    fn session_cookie_is_http_only_with_max_age() {
        let cookie = session_cookie("tok".to_string(), 3600, true);
        assert_eq!(cookie.name(), ACCESS_TOKEN_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
        assert_eq!(cookie.path(), Some("/"));
    }
}
