use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};

use axum_extra::extract::cookie::CookieJar;

use crate::{
    AppState,
    db::UserExt,
    error::{ErrorMessage, HttpError},
    models::{ActiveStatus, User, UserRole},
    utils::token,
};

/// Name of the session cookie set by `/api/auth/login`.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// The signed-in account, inserted into request extensions by [`auth`].
///
/// ```ignore
/// async fn handler(Extension(session): Extension<AuthSession>) {
///     let author_id = session.user.id;
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
}

/// Reads the token from the `access_token` cookie, falling back to
/// `Authorization: Bearer <token>`.
pub fn extract_token(cookie_jar: &CookieJar, req: &Request) -> Option<String> {
    cookie_jar
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.trim().to_owned())
        })
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Rejects with 401 when no token is present, the token does not verify,
/// or the account it names has been deleted or deactivated.
pub async fn auth(
    cookie_jar: CookieJar,
    State(app_state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = extract_token(&cookie_jar, &req)
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let user_id = token::decode_token(token, app_state.env.jwt_secret.as_bytes())
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load session user {}: {}", user_id, e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        })?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    if user.status != ActiveStatus::Active {
        tracing::warn!(user_id, "Inactive account presented a valid token");
        return Err(HttpError::unauthorized(
            ErrorMessage::UserNoLongerExist.to_string(),
        ));
    }

    req.extensions_mut().insert(AuthSession { user });

    Ok(next.run(req).await)
}

/// Role gate, layered inside [`auth`].
///
/// 401 if no session is attached, 403 if the session role is not listed.
pub async fn role_check(
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let session = req
        .extensions()
        .get::<AuthSession>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !required_roles.contains(&session.user.role) {
        return Err(HttpError::forbidden(
            ErrorMessage::PermissionDenied.to_string(),
        ));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn cookie_wins_over_bearer_header() {
        let jar = CookieJar::new().add(Cookie::new(ACCESS_TOKEN_COOKIE, "from-cookie"));
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&jar, &req).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn bearer_header_is_accepted() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer abc.def.ghi")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_token(&CookieJar::new(), &req).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn other_schemes_are_ignored() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&CookieJar::new(), &req), None);
    }
}
