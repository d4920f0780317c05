use super::DBClient;
use crate::dtos::PaginationDto;
use crate::models::{ActiveStatus, Video};

pub struct VideoFields<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub video_url: &'a str,
    pub thumbnail_url: Option<&'a str>,
    pub duration: Option<&'a str>,
    pub display_order: i32,
    pub status: ActiveStatus,
}

pub trait VideoExt {
    async fn get_videos(&self) -> Result<Vec<Video>, sqlx::Error>;

    async fn get_video(&self, video_id: i64) -> Result<Video, sqlx::Error>;

    async fn create_video(&self, fields: VideoFields<'_>) -> Result<Video, sqlx::Error>;

    async fn update_video(&self, video_id: i64, fields: VideoFields<'_>) -> Result<Video, sqlx::Error>;

    async fn delete_video(&self, video_id: i64) -> Result<(), sqlx::Error>;

    /// Active videos in display order
    async fn get_active_videos(&self, page: i64, limit: i64) -> Result<Vec<Video>, sqlx::Error>;

    async fn get_active_video_count(&self) -> Result<i64, sqlx::Error>;
}

impl VideoExt for DBClient {
    async fn get_videos(&self) -> Result<Vec<Video>, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            "SELECT * FROM videos ORDER BY display_order ASC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_video(&self, video_id: i64) -> Result<Video, sqlx::Error> {
        sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
            .bind(video_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_video(&self, fields: VideoFields<'_>) -> Result<Video, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (title, description, video_url, thumbnail_url, duration, display_order, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.video_url)
        .bind(fields.thumbnail_url)
        .bind(fields.duration)
        .bind(fields.display_order)
        .bind(fields.status)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_video(&self, video_id: i64, fields: VideoFields<'_>) -> Result<Video, sqlx::Error> {
        sqlx::query_as::<_, Video>(
            r#"
            UPDATE videos
            SET title = $2, description = $3, video_url = $4, thumbnail_url = $5,
                duration = $6, display_order = $7, status = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(video_id)
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.video_url)
        .bind(fields.thumbnail_url)
        .bind(fields.duration)
        .bind(fields.display_order)
        .bind(fields.status)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_video(&self, video_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(video_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_active_videos(&self, page: i64, limit: i64) -> Result<Vec<Video>, sqlx::Error> {
        let offset = PaginationDto::offset(page, limit);

        sqlx::query_as::<_, Video>(
            r#"
            SELECT * FROM videos
            WHERE status = 'active'
            ORDER BY display_order ASC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_active_video_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM videos WHERE status = 'active'")
            .fetch_one(&self.pool)
            .await
    }
}
