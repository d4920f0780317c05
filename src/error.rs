use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationErrors;

/// Error body sent to clients.
///
/// ```json
/// { "success": false, "message": "Dữ liệu không hợp lệ", "errors": { "title": [...] } }
/// ```
///
/// `errors` is only present for validation failures and carries the
/// per-field report produced by `validator`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

/// Every client-facing error message in one place.
///
/// The portal is Vietnamese, so the rendered text is too.
#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    // Password handling
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,

    // Authentication
    InvalidToken,
    TokenNotProvided,
    UserNotAuthenticated,
    InvalidCredentials,
    UserNoLongerExist,

    // Authorization
    PermissionDenied,

    // Domain rules
    InvalidData,
    NotFound(&'static str),
    AlreadyExists,
    UnknownReference,
    UsernameTaken,
    EmailTaken,
    PasswordRequired,
    CannotDeleteSelf,
    CategoryOwnParent,

    ServerError,
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::EmptyPassword => "Mật khẩu không được để trống".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Mật khẩu không được dài quá {} ký tự", max_length)
            }
            ErrorMessage::InvalidHashFormat => "Định dạng mật khẩu đã lưu không hợp lệ".to_string(),
            ErrorMessage::HashingError => "Lỗi khi mã hóa mật khẩu".to_string(),
            ErrorMessage::InvalidToken => "Phiên đăng nhập không hợp lệ hoặc đã hết hạn".to_string(),
            ErrorMessage::TokenNotProvided => "Bạn chưa đăng nhập".to_string(),
            ErrorMessage::UserNotAuthenticated => "Vui lòng đăng nhập để tiếp tục".to_string(),
            ErrorMessage::InvalidCredentials => {
                "Tên đăng nhập hoặc mật khẩu không đúng".to_string()
            }
            ErrorMessage::UserNoLongerExist => "Tài khoản không còn tồn tại".to_string(),
            ErrorMessage::PermissionDenied => "Bạn không có quyền thực hiện thao tác này".to_string(),
            ErrorMessage::InvalidData => "Dữ liệu không hợp lệ".to_string(),
            ErrorMessage::NotFound(resource) => format!("Không tìm thấy {}", resource),
            ErrorMessage::AlreadyExists => "Dữ liệu đã tồn tại".to_string(),
            ErrorMessage::UnknownReference => "Dữ liệu liên kết không tồn tại".to_string(),
            ErrorMessage::UsernameTaken => "Tên đăng nhập đã tồn tại".to_string(),
            ErrorMessage::EmailTaken => "Email đã tồn tại".to_string(),
            ErrorMessage::PasswordRequired => "Mật khẩu không được để trống".to_string(),
            ErrorMessage::CannotDeleteSelf => "Không thể xóa tài khoản của chính mình".to_string(),
            ErrorMessage::CategoryOwnParent => {
                "Danh mục không thể là danh mục cha của chính nó".to_string()
            }
            ErrorMessage::ServerError => "Lỗi server. Vui lòng thử lại sau".to_string(),
        };
        write!(f, "{}", message)
    }
}

/// Error type returned by every handler and middleware.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
    pub errors: Option<serde_json::Value>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
            errors: None,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn unique_constraint_violation(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::CONFLICT)
    }

    /// 401: the caller is not authenticated.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::UNAUTHORIZED)
    }

    /// 403: authenticated, but the role is not allowed here.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, StatusCode::NOT_FOUND)
    }

    /// 400 carrying the structured per-field report.
    pub fn validation(errors: ValidationErrors) -> Self {
        HttpError {
            message: ErrorMessage::InvalidData.to_string(),
            status: StatusCode::BAD_REQUEST,
            errors: serde_json::to_value(&errors).ok(),
        }
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            success: false,
            message: self.message,
            errors: self.errors,
        });

        (self.status, json_response).into_response()
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Extractor rejections become a 400 with the usual envelope. The axum text
/// only goes to the log.
fn rejected(source: &'static str, status: StatusCode, detail: String) -> HttpError {
    if status.is_server_error() {
        tracing::error!(source, "Extractor failed: {}", detail);
        return HttpError::server_error(ErrorMessage::ServerError.to_string());
    }
    tracing::warn!(source, "Rejected request: {}", detail);
    HttpError::bad_request(ErrorMessage::InvalidData.to_string())
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        rejected("body", rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        rejected("query", rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        rejected("path", rejection.status(), rejection.body_text())
    }
}

/// Maps a database error to the client-facing error for one resource.
///
/// `RowNotFound` becomes 404, unique violations 409, foreign keys naming a
/// missing row 400. Everything else is logged and reported as a generic 500.
///
/// ```ignore
/// app_state.db_client.get_post(id).await.map_err(db_error("get_post", "bài viết"))?;
/// ```
pub fn db_error(operation: &'static str, resource: &'static str) -> impl Fn(sqlx::Error) -> HttpError {
    move |e| match e {
        sqlx::Error::RowNotFound => HttpError::not_found(ErrorMessage::NotFound(resource).to_string()),
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            tracing::warn!(operation, "Unique violation: {}", db_err);
            HttpError::unique_constraint_violation(ErrorMessage::AlreadyExists.to_string())
        }
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            tracing::warn!(operation, "Foreign key violation: {}", db_err);
            HttpError::bad_request(ErrorMessage::UnknownReference.to_string())
        }
        e => {
            tracing::error!(operation, "DB error: {}", e);
            HttpError::server_error(ErrorMessage::ServerError.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use validator::Validate;

    #[derive(Validate)]
    struct TitleInput {
        #[validate(length(min = 1, message = "Tiêu đề không được để trống"))]
        title: String,
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_errors_render_field_report() {
        let errors = TitleInput {
            title: String::new(),
        }
        .validate()
        .unwrap_err();

        let response = HttpError::validation(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Dữ liệu không hợp lệ");
        assert!(body["errors"]["title"].is_array());
    }

    #[tokio::test]
    async fn plain_errors_omit_field_report() {
        let response = HttpError::not_found(ErrorMessage::NotFound("bài viết").to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Không tìm thấy bài viết");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err = db_error("get_video", "video")(sqlx::Error::RowNotFound);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.message, "Không tìm thấy video");
    }

    #[test]
    fn other_db_errors_hide_details() {
        let err = db_error("get_video", "video")(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, ErrorMessage::ServerError.to_string());
    }
}
