use super::DBClient;
use crate::dtos::DashboardStats;
use crate::models::Feedback;

pub trait DashboardExt {
    /// Every counter in one round trip
    async fn get_dashboard_stats(&self) -> Result<DashboardStats, sqlx::Error>;

    async fn get_recent_feedback(&self, limit: i64) -> Result<Vec<Feedback>, sqlx::Error>;
}

impl DashboardExt for DBClient {
    async fn get_dashboard_stats(&self) -> Result<DashboardStats, sqlx::Error> {
        sqlx::query_as::<_, DashboardStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts) AS posts_total,
                (SELECT COUNT(*) FROM posts WHERE status = 'published') AS posts_published,
                (SELECT COUNT(*) FROM posts WHERE status = 'draft') AS posts_draft,
                (SELECT COUNT(*) FROM projects) AS projects_total,
                (SELECT COUNT(*) FROM projects WHERE status = 'published') AS projects_published,
                (SELECT COUNT(*) FROM videos) AS videos_total,
                (SELECT COUNT(*) FROM videos WHERE status = 'active') AS videos_active,
                (SELECT COUNT(*) FROM feedback) AS feedback_total,
                (SELECT COUNT(*) FROM feedback WHERE status = 'pending') AS feedback_pending,
                (SELECT COUNT(*) FROM users) AS users_total,
                (SELECT COUNT(*) FROM categories) AS categories_total,
                (SELECT COUNT(*) FROM slides) AS slides_total,
                (SELECT COUNT(*) FROM slides WHERE is_active) AS slides_active,
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM posts) AS post_views,
                (SELECT COALESCE(SUM(views), 0)::BIGINT FROM projects) AS project_views
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    async fn get_recent_feedback(&self, limit: i64) -> Result<Vec<Feedback>, sqlx::Error> {
        sqlx::query_as::<_, Feedback>("SELECT * FROM feedback ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
    }
}
