use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tracing::instrument;
use validator::Validate;

use crate::AppState;
use crate::db::{
    AboutExt, DrawingExt, FeedbackExt, PostExt, ProjectExt, SettingExt, SlideExt, VideoExt,
};
use crate::dtos::{
    AboutPageDto, ApiResponse, DrawingDetailDto, DrawingSearchQuery, HomePageDto, ListData,
    NewsDetailDto, PaginationDto, ProjectDetailDto, SitePageQuery, VideoDto,
};
use crate::error::{ErrorMessage, HttpError, db_error};
use crate::extract::{Json, Path, Query};
use crate::models::Video;
use crate::utils::content::{reading_time_minutes, youtube_id};

const HOME_SLIDES: i64 = 5;
const HOME_POSTS: i64 = 9;
const HOME_PROJECTS: i64 = 3;
const HOME_VIDEOS: i64 = 3;

const NEWS_PER_PAGE: i64 = 9;
const PROJECTS_PER_PAGE: i64 = 9;
const VIDEOS_PER_PAGE: i64 = 9;
const DRAWINGS_PER_PAGE: i64 = 12;

const RELATED_POSTS: i64 = 2;
const RELATED_PROJECTS: i64 = 3;
const RELATED_DRAWINGS: i64 = 3;
const ANSWERED_FEEDBACK: i64 = 10;

/// Page data for the public portal. Everything here is read-only and
/// shows published or active rows only.
pub fn site_handler() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/news", get(news))
        .route("/news/{slug}", get(news_detail))
        .route("/projects", get(projects))
        .route("/projects/{slug}", get(project_detail))
        .route("/drawings", get(drawings))
        .route("/drawings/{drawing_id}", get(drawing_detail))
        .route("/videos", get(videos))
        .route("/feedback", get(answered_feedback))
        .route("/about", get(about))
}

fn with_youtube_id(video: Video) -> VideoDto {
    let youtube_id = youtube_id(&video.video_url);
    VideoDto { video, youtube_id }
}

#[instrument(skip(app_state))]
pub async fn home(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let db = &app_state.db_client;

    let (slides, posts, projects, videos, settings) = tokio::try_join!(
        async {
            db.get_active_slides(HOME_SLIDES)
                .await
                .map_err(db_error("home_slides", "slide"))
        },
        async {
            db.get_published_posts(1, HOME_POSTS)
                .await
                .map_err(db_error("home_posts", "bài viết"))
        },
        async {
            db.get_published_projects(1, HOME_PROJECTS)
                .await
                .map_err(db_error("home_projects", "dự án"))
        },
        async {
            db.get_active_videos(1, HOME_VIDEOS)
                .await
                .map_err(db_error("home_videos", "video"))
        },
        async {
            db.get_settings()
                .await
                .map_err(db_error("home_settings", "cài đặt"))
        },
    )?;

    Ok(Json(ApiResponse::ok(HomePageDto {
        slides,
        posts,
        projects,
        videos: videos.into_iter().map(with_youtube_id).collect(),
        settings,
    })))
}

#[instrument(skip(app_state))]
pub async fn news(
    Query(params): Query<SitePageQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(HttpError::validation)?;
    let page = params.page.unwrap_or(1);

    let posts = app_state
        .db_client
        .get_published_posts(page, NEWS_PER_PAGE)
        .await
        .map_err(db_error("site_news", "bài viết"))?;
    let total = app_state
        .db_client
        .get_published_post_count()
        .await
        .map_err(db_error("site_news_count", "bài viết"))?;

    Ok(Json(ApiResponse::ok(ListData {
        items: posts,
        pagination: PaginationDto::new(page, NEWS_PER_PAGE, total),
    })))
}

#[instrument(skip(app_state))]
pub async fn news_detail(
    Path(slug): Path<String>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let mut post = app_state
        .db_client
        .get_published_post_by_slug(&slug)
        .await
        .map_err(db_error("site_news_detail", "bài viết"))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::NotFound("bài viết").to_string()))?;

    app_state
        .db_client
        .increment_post_views(post.post.id)
        .await
        .map_err(db_error("increment_post_views", "bài viết"))?;
    post.post.views += 1;

    let related = match post.post.category_id {
        Some(category_id) => app_state
            .db_client
            .get_related_posts(post.post.id, category_id, RELATED_POSTS)
            .await
            .map_err(db_error("related_posts", "bài viết"))?,
        None => Vec::new(),
    };

    let reading_time = reading_time_minutes(&post.post.content);

    Ok(Json(ApiResponse::ok(NewsDetailDto {
        post,
        related,
        reading_time,
    })))
}

#[instrument(skip(app_state))]
pub async fn projects(
    Query(params): Query<SitePageQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(HttpError::validation)?;
    let page = params.page.unwrap_or(1);

    let projects = app_state
        .db_client
        .get_published_projects(page, PROJECTS_PER_PAGE)
        .await
        .map_err(db_error("site_projects", "dự án"))?;
    let total = app_state
        .db_client
        .get_published_project_count()
        .await
        .map_err(db_error("site_projects_count", "dự án"))?;

    Ok(Json(ApiResponse::ok(ListData {
        items: projects,
        pagination: PaginationDto::new(page, PROJECTS_PER_PAGE, total),
    })))
}

#[instrument(skip(app_state))]
pub async fn project_detail(
    Path(slug): Path<String>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let mut project = app_state
        .db_client
        .get_published_project_by_slug(&slug)
        .await
        .map_err(db_error("site_project_detail", "dự án"))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::NotFound("dự án").to_string()))?;

    app_state
        .db_client
        .increment_project_views(project.project.id)
        .await
        .map_err(db_error("increment_project_views", "dự án"))?;
    project.project.views += 1;

    let related = app_state
        .db_client
        .get_related_projects(project.project.id, project.project.category_id, RELATED_PROJECTS)
        .await
        .map_err(db_error("related_projects", "dự án"))?;

    Ok(Json(ApiResponse::ok(ProjectDetailDto { project, related })))
}

#[instrument(skip(app_state))]
pub async fn drawings(
    Query(params): Query<DrawingSearchQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(HttpError::validation)?;
    let page = params.page.unwrap_or(1);
    let search = params.search.as_deref();

    let drawings = app_state
        .db_client
        .search_active_drawings(search, page, DRAWINGS_PER_PAGE)
        .await
        .map_err(db_error("site_drawings", "bản vẽ"))?;
    let total = app_state
        .db_client
        .search_active_drawing_count(search)
        .await
        .map_err(db_error("site_drawings_count", "bản vẽ"))?;

    Ok(Json(ApiResponse::ok(ListData {
        items: drawings,
        pagination: PaginationDto::new(page, DRAWINGS_PER_PAGE, total),
    })))
}

#[instrument(skip(app_state))]
pub async fn drawing_detail(
    Path(drawing_id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let drawing = app_state
        .db_client
        .get_active_drawing(drawing_id)
        .await
        .map_err(db_error("site_drawing_detail", "bản vẽ"))?
        .ok_or_else(|| HttpError::not_found(ErrorMessage::NotFound("bản vẽ").to_string()))?;

    let related = app_state
        .db_client
        .get_related_drawings(drawing.id, RELATED_DRAWINGS)
        .await
        .map_err(db_error("related_drawings", "bản vẽ"))?;

    Ok(Json(ApiResponse::ok(DrawingDetailDto { drawing, related })))
}

#[instrument(skip(app_state))]
pub async fn videos(
    Query(params): Query<SitePageQuery>,
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    params.validate().map_err(HttpError::validation)?;
    let page = params.page.unwrap_or(1);

    let videos = app_state
        .db_client
        .get_active_videos(page, VIDEOS_PER_PAGE)
        .await
        .map_err(db_error("site_videos", "video"))?;
    let total = app_state
        .db_client
        .get_active_video_count()
        .await
        .map_err(db_error("site_videos_count", "video"))?;

    Ok(Json(ApiResponse::ok(ListData {
        items: videos.into_iter().map(with_youtube_id).collect::<Vec<_>>(),
        pagination: PaginationDto::new(page, VIDEOS_PER_PAGE, total),
    })))
}

#[instrument(skip(app_state))]
pub async fn answered_feedback(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, HttpError> {
    let feedback = app_state
        .db_client
        .get_answered_feedback(ANSWERED_FEEDBACK)
        .await
        .map_err(db_error("site_feedback", "góp ý"))?;

    Ok(Json(ApiResponse::ok(feedback)))
}

#[instrument(skip(app_state))]
pub async fn about(State(app_state): State<AppState>) -> Result<impl IntoResponse, HttpError> {
    let about = app_state
        .db_client
        .get_latest_about()
        .await
        .map_err(db_error("site_about", "nội dung giới thiệu"))?
        .ok_or_else(|| {
            HttpError::not_found(ErrorMessage::NotFound("nội dung giới thiệu").to_string())
        })?;

    Ok(Json(ApiResponse::ok(AboutPageDto { about })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActiveStatus;
    use chrono::Utc;

    fn video(url: &str) -> Video {
        Video {
            id: 1,
            title: "Hội nghị quy hoạch".to_string(),
            description: None,
            video_url: url.to_string(),
            thumbnail_url: None,
            duration: Some("12:30".to_string()),
            display_order: 0,
            status: ActiveStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn youtube_videos_get_an_embed_id() {
        let dto = with_youtube_id(video("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert_eq!(dto.youtube_id.as_deref(), Some("dQw4w9WgXcQ"));

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["youtube_id"], "dQw4w9WgXcQ");
        assert_eq!(json["title"], "Hội nghị quy hoạch");
    }

    #[test]
    fn other_hosts_have_no_embed_id() {
        assert_eq!(with_youtube_id(video("https://vimeo.com/12345")).youtube_id, None);
    }
}
