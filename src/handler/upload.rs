use std::path::{Path, PathBuf};

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::response::{IntoResponse, Json};
use axum::routing::post;
use axum::{Router, middleware};
use chrono::Utc;
use tracing::instrument;

use crate::AppState;
use crate::dtos::{ApiResponse, UploadResponse};
use crate::error::{ErrorMessage, HttpError};
use crate::middleware::{auth, role_check};
use crate::models::UserRole;

const MIB: usize = 1024 * 1024;
const IMAGE_MAX_BYTES: usize = 5 * MIB;
const PDF_MAX_BYTES: usize = 10 * MIB;
const DWG_MAX_BYTES: usize = 50 * MIB;

/// Request body cap for the route: the largest file plus multipart overhead.
const BODY_LIMIT: usize = DWG_MAX_BYTES + 5 * MIB;

const IMAGE_TYPES: [&str; 5] = ["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

pub fn upload_handler(app_state: AppState) -> Router<AppState> {
    Router::new().route(
        "/",
        post(upload)
            .layer(DefaultBodyLimit::max(BODY_LIMIT))
            .route_layer(middleware::from_fn(|req, next| {
                role_check(req, next, vec![UserRole::Admin, UserRole::Editor])
            }))
            .route_layer(middleware::from_fn_with_state(app_state, auth)),
    )
}

/// Upload category. Each one is a sub-directory of the upload root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Posts,
    Projects,
    Slides,
    Videos,
    Pdfs,
    Dwg,
    Logo,
    Users,
    Media,
}

impl UploadKind {
    /// Missing or blank means `posts`; unknown names are rejected so the
    /// value can be used as a directory name.
    pub fn parse(raw: Option<&str>) -> Result<UploadKind, HttpError> {
        let kind = match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("posts") => UploadKind::Posts,
            Some("projects") => UploadKind::Projects,
            Some("slides") => UploadKind::Slides,
            Some("videos") => UploadKind::Videos,
            Some("pdfs") => UploadKind::Pdfs,
            Some("dwg") => UploadKind::Dwg,
            Some("logo") => UploadKind::Logo,
            Some("users") => UploadKind::Users,
            Some("media") => UploadKind::Media,
            Some(other) => {
                tracing::warn!(kind = other, "Unknown upload type");
                return Err(HttpError::bad_request("Loại upload không hợp lệ"));
            }
        };
        Ok(kind)
    }

    pub fn dir(&self) -> &'static str {
        match self {
            UploadKind::Posts => "posts",
            UploadKind::Projects => "projects",
            UploadKind::Slides => "slides",
            UploadKind::Videos => "videos",
            UploadKind::Pdfs => "pdfs",
            UploadKind::Dwg => "dwg",
            UploadKind::Logo => "logo",
            UploadKind::Users => "users",
            UploadKind::Media => "media",
        }
    }
}

/// Checks type and size for the upload category.
///
/// PDFs are matched on MIME type, drawings on the `.dwg` extension (browsers
/// report many different MIME types for them), everything else must be an image.
pub fn validate_upload(
    kind: UploadKind,
    content_type: &str,
    file_name: &str,
    size: usize,
) -> Result<(), HttpError> {
    match kind {
        UploadKind::Pdfs => {
            if content_type != "application/pdf" {
                return Err(HttpError::bad_request("Chỉ chấp nhận file PDF"));
            }
            if size > PDF_MAX_BYTES {
                return Err(HttpError::bad_request("File PDF quá lớn. Tối đa 10MB"));
            }
        }
        UploadKind::Dwg => {
            if extension(file_name).as_deref() != Some("dwg") {
                return Err(HttpError::bad_request("Chỉ chấp nhận file .dwg"));
            }
            if size > DWG_MAX_BYTES {
                return Err(HttpError::bad_request("File DWG quá lớn. Tối đa 50MB"));
            }
        }
        _ => {
            if !IMAGE_TYPES.contains(&content_type) {
                return Err(HttpError::bad_request(
                    "Chỉ chấp nhận file ảnh (JPEG, PNG, GIF, WEBP)",
                ));
            }
            if size > IMAGE_MAX_BYTES {
                return Err(HttpError::bad_request("File ảnh quá lớn. Tối đa 5MB"));
            }
        }
    }
    Ok(())
}

/// Lower-cased extension of a client file name, alphanumerics only.
fn extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    let ext: String = ext
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    (!ext.is_empty()).then_some(ext)
}

/// `{millis}-{random}{.ext}`; the client name contributes only its extension.
pub fn stored_file_name(original: &str, now_millis: i64) -> String {
    let random = uuid::Uuid::new_v4().simple();
    match extension(original) {
        Some(ext) => format!("{}-{}.{}", now_millis, random, ext),
        None => format!("{}-{}", now_millis, random),
    }
}

struct IncomingFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> HttpError {
    tracing::warn!("Malformed multipart body: {}", e);
    HttpError::new(e.body_text(), e.status())
}

#[instrument(skip(app_state, multipart))]
pub async fn upload(
    State(app_state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let mut file: Option<IncomingFile> = None;
    let mut kind_raw: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some(IncomingFile {
                    file_name,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            Some("type") => {
                kind_raw = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| HttpError::bad_request("Không có file được upload"))?;
    let kind = UploadKind::parse(kind_raw.as_deref())?;

    validate_upload(kind, &file.content_type, &file.file_name, file.bytes.len())?;

    let dir: PathBuf = Path::new(&app_state.env.upload_dir).join(kind.dir());
    let filename = stored_file_name(&file.file_name, Utc::now().timestamp_millis());

    let write_failed = |e: std::io::Error| {
        tracing::error!("Upload write error: {}", e);
        HttpError::server_error(ErrorMessage::ServerError.to_string())
    };
    tokio::fs::create_dir_all(&dir).await.map_err(write_failed)?;
    tokio::fs::write(dir.join(&filename), &file.bytes)
        .await
        .map_err(write_failed)?;

    tracing::info!(kind = kind.dir(), filename = %filename, size = file.bytes.len(), "File uploaded");

    Ok(Json(ApiResponse::with_message(
        UploadResponse {
            url: format!("/uploads/{}/{}", kind.dir(), filename),
            filename,
            size: file.bytes.len(),
            content_type: file.content_type,
        },
        "Upload thành công",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn type_defaults_to_posts_and_rejects_unknown() {
        assert_eq!(UploadKind::parse(None).unwrap(), UploadKind::Posts);
        assert_eq!(UploadKind::parse(Some("")).unwrap(), UploadKind::Posts);
        assert_eq!(UploadKind::parse(Some("dwg")).unwrap(), UploadKind::Dwg);
        assert!(UploadKind::parse(Some("../etc")).is_err());
    }

    #[test]
    fn images_are_checked_by_mime_and_size() {
        assert!(validate_upload(UploadKind::Slides, "image/png", "a.png", 1024).is_ok());
        assert!(validate_upload(UploadKind::Slides, "application/pdf", "a.pdf", 1024).is_err());
        let err = validate_upload(UploadKind::Posts, "image/jpeg", "a.jpg", IMAGE_MAX_BYTES + 1)
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "File ảnh quá lớn. Tối đa 5MB");
    }

    #[test]
    fn pdfs_need_pdf_mime() {
        assert!(validate_upload(UploadKind::Pdfs, "application/pdf", "qh.pdf", 9 * MIB).is_ok());
        assert!(validate_upload(UploadKind::Pdfs, "image/png", "qh.pdf", 1024).is_err());
        assert!(validate_upload(UploadKind::Pdfs, "application/pdf", "qh.pdf", 11 * MIB).is_err());
    }

    #[test]
    fn dwg_is_checked_by_extension_only() {
        assert!(
            validate_upload(UploadKind::Dwg, "application/octet-stream", "BanVe.DWG", 40 * MIB).is_ok()
        );
        assert!(validate_upload(UploadKind::Dwg, "image/vnd.dwg", "banve.dxf", 1024).is_err());
        assert!(validate_upload(UploadKind::Dwg, "image/vnd.dwg", "banve.dwg", 51 * MIB).is_err());
    }

    #[test]
    fn stored_name_keeps_only_a_clean_extension() {
        let name = stored_file_name("../../Ảnh bìa.PNG", 1_700_000_000_000);
        assert!(name.starts_with("1700000000000-"));
        assert!(name.ends_with(".png"));
        assert!(!name.contains('/'));

        let bare = stored_file_name("README", 1);
        assert!(!bare.contains('.'));
    }
}
