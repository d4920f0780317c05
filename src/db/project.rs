use super::DBClient;
use crate::dtos::{ProjectDto, ProjectRow, PaginationDto};
use crate::models::{Project, ProjectStatus};
use chrono::{DateTime, Utc};

pub struct ProjectFields<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
    pub content: Option<&'a str>,
    pub cover_image: Option<&'a str>,
    pub pdf_file: Option<&'a str>,
    pub category_id: Option<i64>,
    pub status: ProjectStatus,
}

const SELECT_PROJECT_ROW: &str = r#"
    SELECT p.*, c.name AS category_name
    FROM projects p
    LEFT JOIN categories c ON p.category_id = c.id
"#;

const PUBLISHED: &str = "p.status = 'published' AND p.published_at <= NOW()";

pub trait ProjectExt {
    async fn get_projects(
        &self,
        page: i64,
        limit: i64,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<ProjectDto>, sqlx::Error>;

    async fn get_project_count(&self, status: Option<ProjectStatus>) -> Result<i64, sqlx::Error>;

    async fn get_project(&self, project_id: i64) -> Result<ProjectDto, sqlx::Error>;

    async fn create_project(
        &self,
        fields: ProjectFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Project, sqlx::Error>;

    /// Keeps an existing `published_at`
    async fn update_project(
        &self,
        project_id: i64,
        fields: ProjectFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Project, sqlx::Error>;

    async fn delete_project(&self, project_id: i64) -> Result<(), sqlx::Error>;

    async fn get_published_projects(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Vec<ProjectDto>, sqlx::Error>;

    async fn get_published_project_count(&self) -> Result<i64, sqlx::Error>;

    async fn get_published_project_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProjectDto>, sqlx::Error>;

    /// Other published projects, same category first
    async fn get_related_projects(
        &self,
        project_id: i64,
        category_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ProjectDto>, sqlx::Error>;

    async fn increment_project_views(&self, project_id: i64) -> Result<(), sqlx::Error>;

    async fn backfill_project_published_at(&self) -> Result<u64, sqlx::Error>;
}

impl ProjectExt for DBClient {
    async fn get_projects(
        &self,
        page: i64,
        limit: i64,
        status: Option<ProjectStatus>,
    ) -> Result<Vec<ProjectDto>, sqlx::Error> {
        let offset = PaginationDto::offset(page, limit);

        let sql = format!(
            "{SELECT_PROJECT_ROW} WHERE ($1::project_status IS NULL OR p.status = $1) ORDER BY p.created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProjectDto::from).collect())
    }

    async fn get_project_count(&self, status: Option<ProjectStatus>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects WHERE ($1::project_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_project(&self, project_id: i64) -> Result<ProjectDto, sqlx::Error> {
        let sql = format!("{SELECT_PROJECT_ROW} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(project_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn create_project(
        &self,
        fields: ProjectFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (title, slug, description, content, cover_image, pdf_file, category_id, status, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(fields.title)
        .bind(fields.slug)
        .bind(fields.description)
        .bind(fields.content)
        .bind(fields.cover_image)
        .bind(fields.pdf_file)
        .bind(fields.category_id)
        .bind(fields.status)
        .bind(published_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_project(
        &self,
        project_id: i64,
        fields: ProjectFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Project, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = $2,
                slug = $3,
                description = $4,
                content = $5,
                cover_image = $6,
                pdf_file = $7,
                category_id = $8,
                status = $9,
                published_at = COALESCE(published_at, $10),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(project_id)
        .bind(fields.title)
        .bind(fields.slug)
        .bind(fields.description)
        .bind(fields.content)
        .bind(fields.cover_image)
        .bind(fields.pdf_file)
        .bind(fields.category_id)
        .bind(fields.status)
        .bind(published_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_project(&self, project_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_published_projects(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Vec<ProjectDto>, sqlx::Error> {
        let offset = PaginationDto::offset(page, limit);

        let sql = format!(
            "{SELECT_PROJECT_ROW} WHERE {PUBLISHED} ORDER BY p.published_at DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProjectDto::from).collect())
    }

    async fn get_published_project_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects p WHERE p.status = 'published' AND p.published_at <= NOW()",
        )
        .fetch_one(&self.pool)
        .await
    }

    async fn get_published_project_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProjectDto>, sqlx::Error> {
        let sql = format!("{SELECT_PROJECT_ROW} WHERE p.slug = $1 AND {PUBLISHED}");
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(ProjectDto::from))
    }

    async fn get_related_projects(
        &self,
        project_id: i64,
        category_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ProjectDto>, sqlx::Error> {
        let sql = format!(
            r#"{SELECT_PROJECT_ROW}
            WHERE p.id <> $1 AND {PUBLISHED}
            ORDER BY (p.category_id IS NOT DISTINCT FROM $2) DESC, p.published_at DESC
            LIMIT $3"#
        );
        let rows = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(project_id)
            .bind(category_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(ProjectDto::from).collect())
    }

    async fn increment_project_views(&self, project_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET views = views + 1 WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn backfill_project_published_at(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects SET published_at = created_at WHERE status = 'published' AND published_at IS NULL",
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::PgPool;

    fn fields(status: ProjectStatus) -> ProjectFields<'static> {
        ProjectFields {
            title: "Quy hoạch tỉnh",
            slug: "quy-hoach-tinh",
            description: Some("Tóm tắt"),
            content: None,
            cover_image: None,
            pdf_file: None,
            category_id: None,
            status,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL at DATABASE_URL - run with --ignored"]
    async fn republishing_keeps_the_first_published_at(pool: PgPool) {
        let db = DBClient::new(pool);

        let project = db
            .create_project(fields(ProjectStatus::Published), Some(Utc::now() - Duration::days(7)))
            .await
            .unwrap();
        let stamped = project.published_at;
        assert!(stamped.is_some());

        db.update_project(project.id, fields(ProjectStatus::Draft), None)
            .await
            .unwrap();
        let republished = db
            .update_project(project.id, fields(ProjectStatus::Published), Some(Utc::now()))
            .await
            .unwrap();

        assert_eq!(republished.published_at, stamped);
    }
}
