use super::DBClient;
use crate::models::About;

pub trait AboutExt {
    /// Newest first
    async fn get_about_list(&self) -> Result<Vec<About>, sqlx::Error>;

    async fn get_about(&self, about_id: i64) -> Result<About, sqlx::Error>;

    async fn get_latest_about(&self) -> Result<Option<About>, sqlx::Error>;

    async fn create_about(&self, content: &str, image_url: Option<&str>) -> Result<About, sqlx::Error>;

    async fn update_about(
        &self,
        about_id: i64,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<About, sqlx::Error>;

    async fn delete_about(&self, about_id: i64) -> Result<(), sqlx::Error>;
}

impl AboutExt for DBClient {
    async fn get_about_list(&self) -> Result<Vec<About>, sqlx::Error> {
        sqlx::query_as::<_, About>("SELECT * FROM about ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_about(&self, about_id: i64) -> Result<About, sqlx::Error> {
        sqlx::query_as::<_, About>("SELECT * FROM about WHERE id = $1")
            .bind(about_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn get_latest_about(&self) -> Result<Option<About>, sqlx::Error> {
        sqlx::query_as::<_, About>("SELECT * FROM about ORDER BY created_at DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_about(&self, content: &str, image_url: Option<&str>) -> Result<About, sqlx::Error> {
        sqlx::query_as::<_, About>(
            "INSERT INTO about (content, image_url) VALUES ($1, $2) RETURNING *",
        )
        .bind(content)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_about(
        &self,
        about_id: i64,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<About, sqlx::Error> {
        sqlx::query_as::<_, About>(
            r#"
            UPDATE about SET content = $2, image_url = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(about_id)
        .bind(content)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_about(&self, about_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM about WHERE id = $1")
            .bind(about_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
