use super::DBClient;
use crate::dtos::PaginationDto;
use crate::models::{ActiveStatus, Drawing};

pub struct DrawingFields<'a> {
    pub title: &'a str,
    pub dwg_file: &'a str,
    pub icon: Option<&'a str>,
    pub status: ActiveStatus,
    pub display_order: i32,
}

pub trait DrawingExt {
    async fn get_drawings(
        &self,
        page: i64,
        limit: i64,
        status: Option<ActiveStatus>,
    ) -> Result<Vec<Drawing>, sqlx::Error>;

    async fn get_drawing_count(&self, status: Option<ActiveStatus>) -> Result<i64, sqlx::Error>;

    async fn get_drawing(&self, drawing_id: i64) -> Result<Drawing, sqlx::Error>;

    async fn create_drawing(&self, fields: DrawingFields<'_>) -> Result<Drawing, sqlx::Error>;

    async fn update_drawing(
        &self,
        drawing_id: i64,
        fields: DrawingFields<'_>,
    ) -> Result<Drawing, sqlx::Error>;

    async fn delete_drawing(&self, drawing_id: i64) -> Result<(), sqlx::Error>;

    /// Active drawings whose title contains `search`, case-insensitive
    async fn search_active_drawings(
        &self,
        search: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Drawing>, sqlx::Error>;

    async fn search_active_drawing_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error>;

    async fn get_active_drawing(&self, drawing_id: i64) -> Result<Option<Drawing>, sqlx::Error>;

    async fn get_related_drawings(&self, drawing_id: i64, limit: i64) -> Result<Vec<Drawing>, sqlx::Error>;
}

/// `%term%` with LIKE wildcards in the term escaped
fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(str::trim).filter(|s| !s.is_empty()).map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

impl DrawingExt for DBClient {
    async fn get_drawings(
        &self,
        page: i64,
        limit: i64,
        status: Option<ActiveStatus>,
    ) -> Result<Vec<Drawing>, sqlx::Error> {
        let offset = PaginationDto::offset(page, limit);

        sqlx::query_as::<_, Drawing>(
            r#"
            SELECT * FROM drawings
            WHERE ($1::account_status IS NULL OR status = $1)
            ORDER BY display_order ASC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_drawing_count(&self, status: Option<ActiveStatus>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM drawings WHERE ($1::account_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_drawing(&self, drawing_id: i64) -> Result<Drawing, sqlx::Error> {
        sqlx::query_as::<_, Drawing>("SELECT * FROM drawings WHERE id = $1")
            .bind(drawing_id)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_drawing(&self, fields: DrawingFields<'_>) -> Result<Drawing, sqlx::Error> {
        sqlx::query_as::<_, Drawing>(
            r#"
            INSERT INTO drawings (title, dwg_file, icon, status, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(fields.title)
        .bind(fields.dwg_file)
        .bind(fields.icon)
        .bind(fields.status)
        .bind(fields.display_order)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_drawing(
        &self,
        drawing_id: i64,
        fields: DrawingFields<'_>,
    ) -> Result<Drawing, sqlx::Error> {
        sqlx::query_as::<_, Drawing>(
            r#"
            UPDATE drawings
            SET title = $2, dwg_file = $3, icon = $4, status = $5, display_order = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(drawing_id)
        .bind(fields.title)
        .bind(fields.dwg_file)
        .bind(fields.icon)
        .bind(fields.status)
        .bind(fields.display_order)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_drawing(&self, drawing_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM drawings WHERE id = $1")
            .bind(drawing_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn search_active_drawings(
        &self,
        search: Option<&str>,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Drawing>, sqlx::Error> {
        let offset = PaginationDto::offset(page, limit);

        sqlx::query_as::<_, Drawing>(
            r#"
            SELECT * FROM drawings
            WHERE status = 'active' AND ($1::text IS NULL OR title ILIKE $1)
            ORDER BY display_order ASC, created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(like_pattern(search))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn search_active_drawing_count(&self, search: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM drawings WHERE status = 'active' AND ($1::text IS NULL OR title ILIKE $1)",
        )
        .bind(like_pattern(search))
        .fetch_one(&self.pool)
        .await
    }

    async fn get_active_drawing(&self, drawing_id: i64) -> Result<Option<Drawing>, sqlx::Error> {
        sqlx::query_as::<_, Drawing>("SELECT * FROM drawings WHERE id = $1 AND status = 'active'")
            .bind(drawing_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_related_drawings(&self, drawing_id: i64, limit: i64) -> Result<Vec<Drawing>, sqlx::Error> {
        sqlx::query_as::<_, Drawing>(
            r#"
            SELECT * FROM drawings
            WHERE status = 'active' AND id <> $1
            ORDER BY display_order ASC, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(drawing_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn blank_search_means_no_filter() {
        assert_eq!(like_pattern(None), None);
        assert_eq!(like_pattern(Some("   ")), None);
    }

    #[test]
    fn search_wildcards_are_escaped() {
        assert_eq!(like_pattern(Some(" mặt bằng ")).as_deref(), Some("%mặt bằng%"));
        assert_eq!(like_pattern(Some("50%_a")).as_deref(), Some("%50\\%\\_a%"));
    }
}
