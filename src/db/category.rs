use super::DBClient;
use crate::dtos::{CategoryDto, CategoryRow};
use crate::models::Category;

pub struct CategoryFields<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub parent_id: Option<i64>,
    pub display_order: i32,
}

const SELECT_CATEGORY_ROW: &str = r#"
    SELECT c.*,
           parent.name AS parent_name,
           (SELECT COUNT(*) FROM posts WHERE category_id = c.id) AS post_count,
           (SELECT COUNT(*) FROM projects WHERE category_id = c.id) AS project_count
    FROM categories c
    LEFT JOIN categories parent ON c.parent_id = parent.id
"#;

pub trait CategoryExt {
    /// Ordered by display order, then name
    async fn get_categories(&self) -> Result<Vec<CategoryDto>, sqlx::Error>;

    async fn get_category(&self, category_id: i64) -> Result<CategoryDto, sqlx::Error>;

    async fn create_category(&self, fields: CategoryFields<'_>) -> Result<Category, sqlx::Error>;

    async fn update_category(
        &self,
        category_id: i64,
        fields: CategoryFields<'_>,
    ) -> Result<Category, sqlx::Error>;

    async fn delete_category(&self, category_id: i64) -> Result<(), sqlx::Error>;
}

impl CategoryExt for DBClient {
    async fn get_categories(&self) -> Result<Vec<CategoryDto>, sqlx::Error> {
        let sql = format!("{SELECT_CATEGORY_ROW} ORDER BY c.display_order ASC, c.name ASC");
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(CategoryDto::from).collect())
    }

    async fn get_category(&self, category_id: i64) -> Result<CategoryDto, sqlx::Error> {
        let sql = format!("{SELECT_CATEGORY_ROW} WHERE c.id = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(category_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn create_category(&self, fields: CategoryFields<'_>) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, slug, description, parent_id, display_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(fields.name)
        .bind(fields.slug)
        .bind(fields.description)
        .bind(fields.parent_id)
        .bind(fields.display_order)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_category(
        &self,
        category_id: i64,
        fields: CategoryFields<'_>,
    ) -> Result<Category, sqlx::Error> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = $2, slug = $3, description = $4, parent_id = $5, display_order = $6, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(category_id)
        .bind(fields.name)
        .bind(fields.slug)
        .bind(fields.description)
        .bind(fields.parent_id)
        .bind(fields.display_order)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_category(&self, category_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }
}
