use super::DBClient;
use crate::models::Slide;

pub struct SlideFields<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub image_url: &'a str,
    pub link_url: Option<&'a str>,
    pub display_order: i32,
    pub is_active: bool,
}

pub trait SlideExt {
    async fn get_slides(&self) -> Result<Vec<Slide>, sqlx::Error>;

    async fn get_slide(&self, slide_id: i64) -> Result<Slide, sqlx::Error>;

    async fn create_slide(&self, fields: SlideFields<'_>) -> Result<Slide, sqlx::Error>;

    async fn update_slide(&self, slide_id: i64, fields: SlideFields<'_>) -> Result<Slide, sqlx::Error>;

    async fn delete_slide(&self, slide_id: i64) -> Result<(), sqlx::Error>;

    /// Carousel slides for the home page
    async fn get_active_slides(&self, limit: i64) -> Result<Vec<Slide>, sqlx::Error>;
}

impl SlideExt for DBClient {
    async fn get_slides(&self) -> Result<Vec<Slide>, sqlx::Error> {
        sqlx::query_as::<_, Slide>(
            "SELECT * FROM slides ORDER BY display_order ASC, created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_slide(&self, slide_id: i64) -> Result<Slide, sqlx::Error> {
        sqlx::query_as::<_, Slide>("SELECT * FROM slides WHERE id = $1")
            .bind(slide_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_slide(&self, fields: SlideFields<'_>) -> Result<Slide, sqlx::Error> {
        sqlx::query_as::<_, Slide>(
            r#"
            INSERT INTO slides (title, description, image_url, link_url, display_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.image_url)
        .bind(fields.link_url)
        .bind(fields.display_order)
        .bind(fields.is_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_slide(&self, slide_id: i64, fields: SlideFields<'_>) -> Result<Slide, sqlx::Error> {
        sqlx::query_as::<_, Slide>(
            r#"
            UPDATE slides
            SET title = $2, description = $3, image_url = $4, link_url = $5,
                display_order = $6, is_active = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(slide_id)
        .bind(fields.title)
        .bind(fields.description)
        .bind(fields.image_url)
        .bind(fields.link_url)
        .bind(fields.display_order)
        .bind(fields.is_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_slide(&self, slide_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM slides WHERE id = $1")
            .bind(slide_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_active_slides(&self, limit: i64) -> Result<Vec<Slide>, sqlx::Error> {
        sqlx::query_as::<_, Slide>(
            "SELECT * FROM slides WHERE is_active ORDER BY display_order ASC, created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}
