use crate::models::{
    About, ActiveStatus, Category, Drawing, Feedback, FeedbackStatus, Post, PostStatus, Project,
    ProjectStatus, Setting, Slide, User, UserRole, Video,
};
use crate::utils::content::non_empty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// DTOs define exactly what crosses the HTTP boundary. Field names follow the
// snake_case columns the admin front end already uses; pagination keeps its
// camelCase `totalPages`.

// ============================================================================
// Envelope
// ============================================================================

/// `{ success, data?, message? }`, the body of every successful response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Pagination & Query DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PaginationDto {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl PaginationDto {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        PaginationDto {
            page,
            limit,
            total,
            total_pages,
        }
    }

    pub fn offset(page: i64, limit: i64) -> i64 {
        (page.max(1) - 1).saturating_mul(limit)
    }
}

/// A page of rows plus its pagination metadata.
#[derive(Debug, Serialize)]
pub struct ListData<T: Serialize> {
    pub items: Vec<T>,
    pub pagination: PaginationDto,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostListQuery {
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    pub status: Option<PostStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProjectListQuery {
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DrawingListQuery {
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,

    pub status: Option<ActiveStatus>,
}

/// `?status=pending|answered|archived|all`
#[derive(Debug, Deserialize)]
pub struct FeedbackListQuery {
    pub status: Option<String>,
}

/// Public listing pages only take a page number; the page size is fixed.
#[derive(Debug, Deserialize, Validate)]
pub struct SitePageQuery {
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DrawingSearchQuery {
    #[validate(range(min = 1, max = 1_000_000))]
    pub page: Option<i64>,

    #[validate(length(max = 255))]
    pub search: Option<String>,
}

// ============================================================================
// Auth & User DTOs
// ============================================================================

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Tên đăng nhập không được để trống"))]
    pub username: String,

    #[validate(length(min = 1, message = "Mật khẩu không được để trống"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct CreateUserDto {
    #[validate(length(min = 3, max = 50, message = "Tên đăng nhập tối thiểu 3 ký tự"))]
    pub username: String,

    #[validate(
        email(message = "Email không hợp lệ"),
        length(max = 100, message = "Email không hợp lệ")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Mật khẩu phải từ 6 đến 64 ký tự"))]
    pub password: Option<String>,

    #[validate(length(max = 100))]
    pub full_name: Option<String>,

    pub avatar: Option<String>,

    #[serde(default)]
    pub role: UserRole,

    #[serde(default)]
    pub status: ActiveStatus,
}

/// Username is fixed at creation; a blank or absent password keeps the old one.
#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct UpdateUserDto {
    #[validate(
        email(message = "Email không hợp lệ"),
        length(max = 100, message = "Email không hợp lệ")
    )]
    pub email: String,

    #[validate(length(min = 6, max = 64, message = "Mật khẩu phải từ 6 đến 64 ký tự"))]
    pub password: Option<String>,

    #[validate(length(max = 100))]
    pub full_name: Option<String>,

    pub avatar: Option<String>,

    #[serde(default)]
    pub role: UserRole,

    #[serde(default)]
    pub status: ActiveStatus,
}

/// User data safe to send to clients (no password hash).
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterUserDto {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub status: ActiveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id,
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            full_name: user.full_name.to_owned(),
            avatar: user.avatar.to_owned(),
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: FilterUserDto,
    pub access_token: String,
}

// ============================================================================
// Shared relation stubs
// ============================================================================

#[derive(Debug, Serialize, Clone)]
pub struct AuthorRef {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ReplierRef {
    pub id: i64,
    pub full_name: Option<String>,
    pub email: String,
}

// ============================================================================
// Post DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputPostDto {
    #[validate(length(min = 1, max = 255, message = "Tiêu đề không được để trống"))]
    pub title: String,

    #[validate(length(min = 1, message = "Nội dung không được để trống"))]
    pub content: String,

    #[validate(length(max = 500))]
    pub excerpt: Option<String>,

    pub cover_image: Option<String>,

    #[validate(range(min = 1))]
    pub category_id: Option<i64>,

    #[serde(default)]
    pub status: PostStatus,
}

/// `posts` row joined with its author and category names.
#[derive(Debug, sqlx::FromRow)]
pub struct PostRow {
    #[sqlx(flatten)]
    pub post: Post,
    pub author_username: Option<String>,
    pub author_full_name: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<AuthorRef>,
    pub category: Option<CategoryRef>,
}

impl From<PostRow> for PostDto {
    fn from(row: PostRow) -> Self {
        let author = match (row.post.author_id, row.author_username) {
            (Some(id), Some(username)) => Some(AuthorRef {
                id,
                username,
                full_name: row.author_full_name,
            }),
            _ => None,
        };
        let category = category_ref(row.post.category_id, row.category_name);

        PostDto {
            post: row.post,
            author,
            category,
        }
    }
}

fn category_ref(id: Option<i64>, name: Option<String>) -> Option<CategoryRef> {
    match (id, name) {
        (Some(id), Some(name)) => Some(CategoryRef { id, name }),
        _ => None,
    }
}

// ============================================================================
// Project DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputProjectDto {
    #[validate(length(min = 1, max = 255, message = "Tiêu đề không được để trống"))]
    pub title: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub content: Option<String>,

    pub cover_image: Option<String>,

    pub pdf_file: Option<String>,

    #[validate(range(min = 1))]
    pub category_id: Option<i64>,

    #[serde(default)]
    pub status: ProjectStatus,
}

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRow {
    #[sqlx(flatten)]
    pub project: Project,
    pub category_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDto {
    #[serde(flatten)]
    pub project: Project,
    pub category: Option<CategoryRef>,
}

impl From<ProjectRow> for ProjectDto {
    fn from(row: ProjectRow) -> Self {
        let category = category_ref(row.project.category_id, row.category_name);
        ProjectDto {
            project: row.project,
            category,
        }
    }
}

// ============================================================================
// Category DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Tên danh mục không được để trống"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 1))]
    pub parent_id: Option<i64>,

    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CategoryRow {
    #[sqlx(flatten)]
    pub category: Category,
    pub parent_name: Option<String>,
    pub post_count: i64,
    pub project_count: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryCounts {
    pub posts: i64,
    pub projects: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoryDto {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<CategoryRef>,
    #[serde(rename = "_count")]
    pub count: CategoryCounts,
}

impl From<CategoryRow> for CategoryDto {
    fn from(row: CategoryRow) -> Self {
        let parent = category_ref(row.category.parent_id, row.parent_name);
        CategoryDto {
            category: row.category,
            parent,
            count: CategoryCounts {
                posts: row.post_count,
                projects: row.project_count,
            },
        }
    }
}

// ============================================================================
// Video / Slide / Drawing DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputVideoDto {
    #[validate(length(min = 1, max = 255, message = "Tiêu đề không được để trống"))]
    pub title: String,

    pub description: Option<String>,

    #[validate(
        url(message = "URL video không hợp lệ"),
        length(max = 500, message = "URL video không hợp lệ")
    )]
    pub video_url: String,

    pub thumbnail_url: Option<String>,

    #[validate(length(max = 20))]
    pub duration: Option<String>,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default)]
    pub status: ActiveStatus,
}

/// Video with its YouTube id resolved for embedding.
#[derive(Debug, Serialize)]
pub struct VideoDto {
    #[serde(flatten)]
    pub video: Video,
    pub youtube_id: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputSlideDto {
    #[validate(length(max = 255))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Hình ảnh không được để trống"))]
    pub image_url: String,

    pub link_url: Option<String>,

    #[serde(default)]
    pub display_order: i32,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputDrawingDto {
    #[validate(length(min = 1, max = 255, message = "Tiêu đề và file DWG là bắt buộc"))]
    pub title: String,

    #[validate(length(min = 1, max = 255, message = "Tiêu đề và file DWG là bắt buộc"))]
    pub dwg_file: String,

    pub icon: Option<String>,

    #[serde(default)]
    pub status: ActiveStatus,

    #[serde(default)]
    pub display_order: i32,
}

#[derive(Debug, Serialize)]
pub struct DrawingDetailDto {
    pub drawing: Drawing,
    pub related: Vec<Drawing>,
}

// ============================================================================
// Feedback DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateFeedbackDto {
    #[validate(length(min = 1, max = 100, message = "Tên không được để trống"))]
    pub name: String,

    #[validate(
        email(message = "Email không hợp lệ"),
        length(max = 100, message = "Email không hợp lệ")
    )]
    pub email: String,

    #[validate(length(max = 20))]
    pub phone: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Tiêu đề không được để trống"))]
    pub subject: String,

    #[validate(length(min = 1, message = "Nội dung không được để trống"))]
    pub message: String,
}

impl CreateFeedbackDto {
    /// Whitespace-only fields become empty so `validate` rejects them.
    pub fn trimmed(self) -> Self {
        CreateFeedbackDto {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_empty(self.phone).map(|p| p.trim().to_string()),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ReplyFeedbackDto {
    pub admin_reply: Option<String>,

    #[serde(default)]
    pub status: FeedbackStatus,
}

#[derive(Debug, sqlx::FromRow)]
pub struct FeedbackRow {
    #[sqlx(flatten)]
    pub feedback: Feedback,
    pub replier_full_name: Option<String>,
    pub replier_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackDto {
    #[serde(flatten)]
    pub feedback: Feedback,
    pub replier: Option<ReplierRef>,
}

impl From<FeedbackRow> for FeedbackDto {
    fn from(row: FeedbackRow) -> Self {
        let replier = match (row.feedback.replied_by, row.replier_email) {
            (Some(id), Some(email)) => Some(ReplierRef {
                id,
                full_name: row.replier_full_name,
                email,
            }),
            _ => None,
        };
        FeedbackDto {
            feedback: row.feedback,
            replier,
        }
    }
}

// ============================================================================
// Settings & About DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateSettingsDto {
    #[validate(length(min = 1, max = 255, message = "Tên trang không được để trống"))]
    pub site_name: String,
    pub site_logo: Option<String>,
    pub site_favicon: Option<String>,
    pub footer_about: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_address: Option<String>,
    pub facebook_url: Option<String>,
    pub youtube_url: Option<String>,
    pub footer_copyright: Option<String>,
}

impl UpdateSettingsDto {
    pub fn trimmed(self) -> Self {
        UpdateSettingsDto {
            site_name: self.site_name.trim().to_string(),
            site_logo: non_empty(self.site_logo),
            site_favicon: non_empty(self.site_favicon),
            footer_about: non_empty(self.footer_about),
            contact_email: non_empty(self.contact_email),
            contact_phone: non_empty(self.contact_phone),
            contact_address: non_empty(self.contact_address),
            facebook_url: non_empty(self.facebook_url),
            youtube_url: non_empty(self.youtube_url),
            footer_copyright: non_empty(self.footer_copyright),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct InputAboutDto {
    #[validate(length(min = 1, message = "Nội dung không được để trống"))]
    pub content: String,

    pub image_url: Option<String>,
}

// ============================================================================
// Upload DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: String,
}

// ============================================================================
// Page data (public site and dashboard)
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HomePageDto {
    pub slides: Vec<Slide>,
    pub posts: Vec<PostDto>,
    pub projects: Vec<ProjectDto>,
    pub videos: Vec<VideoDto>,
    pub settings: Setting,
}

#[derive(Debug, Serialize)]
pub struct NewsDetailDto {
    pub post: PostDto,
    pub related: Vec<PostDto>,
    pub reading_time: i64,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailDto {
    pub project: ProjectDto,
    pub related: Vec<ProjectDto>,
}

#[derive(Debug, Serialize)]
pub struct AboutPageDto {
    pub about: About,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DashboardStats {
    pub posts_total: i64,
    pub posts_published: i64,
    pub posts_draft: i64,
    pub projects_total: i64,
    pub projects_published: i64,
    pub videos_total: i64,
    pub videos_active: i64,
    pub feedback_total: i64,
    pub feedback_pending: i64,
    pub users_total: i64,
    pub categories_total: i64,
    pub slides_total: i64,
    pub slides_active: i64,
    pub post_views: i64,
    pub project_views: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardDto {
    pub stats: DashboardStats,
    pub recent_posts: Vec<PostDto>,
    pub recent_projects: Vec<ProjectDto>,
    pub recent_feedback: Vec<Feedback>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_pages_up() {
        let p = PaginationDto::new(2, 9, 19);
        assert_eq!(p.total_pages, 3);
        assert_eq!(PaginationDto::new(1, 9, 0).total_pages, 0);
        assert_eq!(PaginationDto::offset(3, 9), 18);
        assert_eq!(PaginationDto::offset(0, 9), 0);
    }

    #[test]
    fn huge_page_numbers_are_rejected_and_never_overflow() {
        let query = SitePageQuery { page: Some(i64::MAX) };
        assert!(query.validate().unwrap_err().field_errors().contains_key("page"));
        assert_eq!(PaginationDto::offset(i64::MAX, 9), i64::MAX);
        assert!(SitePageQuery { page: Some(1_000_000) }.validate().is_ok());
    }

    #[test]
    fn pagination_serializes_total_pages_camel_case() {
        let json = serde_json::to_value(PaginationDto::new(1, 20, 45)).unwrap();
        assert_eq!(json["totalPages"], 3);
    }

    #[test]
    fn post_input_defaults_to_draft() {
        let body: InputPostDto =
            serde_json::from_str(r#"{"title":"Tin mới","content":"<p>Nội dung</p>"}"#).unwrap();
        assert_eq!(body.status, PostStatus::Draft);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn post_input_requires_title() {
        let body: InputPostDto =
            serde_json::from_str(r#"{"title":"","content":"<p>x</p>"}"#).unwrap();
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));
    }

    #[test]
    fn video_url_must_be_a_url() {
        let body: InputVideoDto =
            serde_json::from_str(r#"{"title":"Clip","video_url":"khong-phai-url"}"#).unwrap();
        assert!(body.validate().unwrap_err().field_errors().contains_key("video_url"));
    }

    #[test]
    fn slide_is_active_by_default() {
        let body: InputSlideDto = serde_json::from_str(r#"{"image_url":"/uploads/slides/a.png"}"#).unwrap();
        assert!(body.is_active);
    }

    #[test]
    fn feedback_rejects_bad_email() {
        let body = CreateFeedbackDto {
            name: "Nguyễn Văn A".to_string(),
            email: "khong-hop-le".to_string(),
            phone: None,
            subject: "Góp ý".to_string(),
            message: "Nội dung".to_string(),
        };
        assert!(body.validate().unwrap_err().field_errors().contains_key("email"));
    }

    #[test]
    fn blank_feedback_fields_fail_after_trimming() {
        let body = CreateFeedbackDto {
            name: "   ".to_string(),
            email: " dan@example.vn ".to_string(),
            phone: Some("  ".to_string()),
            subject: "Góp ý".to_string(),
            message: "\n\t".to_string(),
        }
        .trimmed();
        assert_eq!(body.email, "dan@example.vn");
        assert_eq!(body.phone, None);
        let errors = body.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("message"));
        assert!(!errors.field_errors().contains_key("email"));
    }

    #[test]
    fn blank_site_name_fails_after_trimming() {
        let body: UpdateSettingsDto =
            serde_json::from_str(r#"{"site_name":"   ","contact_email":""}"#).unwrap();
        let body = body.trimmed();
        assert_eq!(body.contact_email, None);
        assert!(body.validate().unwrap_err().field_errors().contains_key("site_name"));
    }

    #[test]
    fn user_password_is_optional_but_bounded() {
        let mut body = UpdateUserDto {
            email: "editor@example.vn".to_string(),
            ..Default::default()
        };
        assert!(body.validate().is_ok());
        body.password = Some("123".to_string());
        assert!(body.validate().is_err());
        body.password = Some("x".repeat(65));
        assert!(body.validate().unwrap_err().field_errors().contains_key("password"));
    }

    #[test]
    fn new_user_password_has_an_upper_bound() {
        let body = CreateUserDto {
            username: "bientap".to_string(),
            email: "bientap@example.vn".to_string(),
            password: Some("x".repeat(65)),
            ..Default::default()
        };
        assert!(body.validate().unwrap_err().field_errors().contains_key("password"));
    }

    #[test]
    fn api_response_omits_absent_fields() {
        let json = serde_json::to_value(ApiResponse::message("Đã xóa video")).unwrap();
        assert_eq!(json["success"], true);
        assert!(json.get("data").is_none());
    }
}
