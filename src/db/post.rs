use super::DBClient;
use crate::dtos::{PostDto, PostRow, PaginationDto};
use crate::models::{Post, PostStatus};
use chrono::{DateTime, Utc};

/// Values written by create and update; `content` is already sanitized.
pub struct PostFields<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub content: &'a str,
    pub excerpt: Option<&'a str>,
    pub cover_image: Option<&'a str>,
    pub category_id: Option<i64>,
    pub status: PostStatus,
}

const SELECT_POST_ROW: &str = r#"
    SELECT p.*, u.username AS author_username, u.full_name AS author_full_name, c.name AS category_name
    FROM posts p
    LEFT JOIN users u ON p.author_id = u.id
    LEFT JOIN categories c ON p.category_id = c.id
"#;

const PUBLISHED: &str = "p.status = 'published' AND p.published_at <= NOW()";

pub trait PostExt {
    /// Admin listing, newest first, optionally filtered by status
    async fn get_posts(
        &self,
        page: i64,
        limit: i64,
        status: Option<PostStatus>,
    ) -> Result<Vec<PostDto>, sqlx::Error>;

    async fn get_post_count(&self, status: Option<PostStatus>) -> Result<i64, sqlx::Error>;

    async fn get_post(&self, post_id: i64) -> Result<PostDto, sqlx::Error>;

    /// `published_at` is only written when the row has none yet
    async fn create_post(
        &self,
        author_id: i64,
        fields: PostFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Post, sqlx::Error>;

    async fn update_post(
        &self,
        post_id: i64,
        fields: PostFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Post, sqlx::Error>;

    async fn delete_post(&self, post_id: i64) -> Result<(), sqlx::Error>;

    // Public site queries: published and already released

    async fn get_published_posts(&self, page: i64, limit: i64) -> Result<Vec<PostDto>, sqlx::Error>;

    async fn get_published_post_count(&self) -> Result<i64, sqlx::Error>;

    async fn get_published_post_by_slug(&self, slug: &str) -> Result<Option<PostDto>, sqlx::Error>;

    async fn get_related_posts(
        &self,
        post_id: i64,
        category_id: i64,
        limit: i64,
    ) -> Result<Vec<PostDto>, sqlx::Error>;

    async fn increment_post_views(&self, post_id: i64) -> Result<(), sqlx::Error>;

    /// Gives published rows without a date their creation date. Returns rows touched.
    async fn backfill_post_published_at(&self) -> Result<u64, sqlx::Error>;
}

impl PostExt for DBClient {
    async fn get_posts(
        &self,
        page: i64,
        limit: i64,
        status: Option<PostStatus>,
    ) -> Result<Vec<PostDto>, sqlx::Error> {
        let offset = PaginationDto::offset(page, limit);

        let sql = format!(
            "{SELECT_POST_ROW} WHERE ($1::post_status IS NULL OR p.status = $1) ORDER BY p.created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostDto::from).collect())
    }

    async fn get_post_count(&self, status: Option<PostStatus>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE ($1::post_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_post(&self, post_id: i64) -> Result<PostDto, sqlx::Error> {
        let sql = format!("{SELECT_POST_ROW} WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn create_post(
        &self,
        author_id: i64,
        fields: PostFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Post, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, slug, content, excerpt, cover_image, category_id, status, author_id, published_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(fields.title)
        .bind(fields.slug)
        .bind(fields.content)
        .bind(fields.excerpt)
        .bind(fields.cover_image)
        .bind(fields.category_id)
        .bind(fields.status)
        .bind(author_id)
        .bind(published_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_post(
        &self,
        post_id: i64,
        fields: PostFields<'_>,
        published_at: Option<DateTime<Utc>>,
    ) -> Result<Post, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $2,
                slug = $3,
                content = $4,
                excerpt = $5,
                cover_image = $6,
                category_id = $7,
                status = $8,
                published_at = COALESCE(published_at, $9),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(fields.title)
        .bind(fields.slug)
        .bind(fields.content)
        .bind(fields.excerpt)
        .bind(fields.cover_image)
        .bind(fields.category_id)
        .bind(fields.status)
        .bind(published_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_post(&self, post_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_published_posts(&self, page: i64, limit: i64) -> Result<Vec<PostDto>, sqlx::Error> {
        let offset = PaginationDto::offset(page, limit);

        let sql = format!(
            "{SELECT_POST_ROW} WHERE {PUBLISHED} ORDER BY p.published_at DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostDto::from).collect())
    }

    async fn get_published_post_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts p WHERE p.status = 'published' AND p.published_at <= NOW()",
        )
        .fetch_one(&self.pool)
        .await
    }

    async fn get_published_post_by_slug(&self, slug: &str) -> Result<Option<PostDto>, sqlx::Error> {
        let sql = format!("{SELECT_POST_ROW} WHERE p.slug = $1 AND {PUBLISHED}");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostDto::from))
    }

    async fn get_related_posts(
        &self,
        post_id: i64,
        category_id: i64,
        limit: i64,
    ) -> Result<Vec<PostDto>, sqlx::Error> {
        let sql = format!(
            "{SELECT_POST_ROW} WHERE p.category_id = $1 AND p.id <> $2 AND {PUBLISHED} ORDER BY p.published_at DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(category_id)
            .bind(post_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PostDto::from).collect())
    }

    async fn increment_post_views(&self, post_id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE posts SET views = views + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn backfill_post_published_at(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE posts SET published_at = created_at WHERE status = 'published' AND published_at IS NULL",
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{UserExt, UserFields};
    use crate::models::{ActiveStatus, UserRole};
    use chrono::Duration;
    use sqlx::PgPool;

    async fn editor(db: &DBClient) -> i64 {
        db.save_user(
            "bientap",
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
            UserFields {
                email: "bientap@example.vn",
                full_name: Some("Biên tập viên"),
                avatar: None,
                role: UserRole::Editor,
                status: ActiveStatus::Active,
            },
        )
        .await
        .unwrap()
        .id
    }

    fn fields(title: &str, status: PostStatus) -> PostFields<'_> {
        PostFields {
            title,
            slug: "quy-hoach-vung",
            content: "<p>Nội dung</p>",
            excerpt: None,
            cover_image: None,
            category_id: None,
            status,
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL at DATABASE_URL - run with --ignored"]
    async fn published_at_is_stamped_once(pool: PgPool) {
        let db = DBClient::new(pool);
        let author_id = editor(&db).await;
        let first = Utc::now() - Duration::days(3);

        let post = db
            .create_post(author_id, fields("Quy hoạch vùng", PostStatus::Published), Some(first))
            .await
            .unwrap();
        let stamped = post.published_at.unwrap();

        // Editing a published post offers a newer stamp; it is ignored.
        let edited = db
            .update_post(
                post.id,
                fields("Quy hoạch vùng (sửa)", PostStatus::Published),
                Some(Utc::now()),
            )
            .await
            .unwrap();
        assert_eq!(edited.published_at, Some(stamped));

        // Unpublish, then publish again.
        let draft = db
            .update_post(post.id, fields("Quy hoạch vùng", PostStatus::Draft), None)
            .await
            .unwrap();
        assert_eq!(draft.published_at, Some(stamped));

        let republished = db
            .update_post(
                post.id,
                fields("Quy hoạch vùng", PostStatus::Published),
                Some(Utc::now() + Duration::hours(1)),
            )
            .await
            .unwrap();
        assert_eq!(republished.status, PostStatus::Published);
        assert_eq!(republished.published_at, Some(stamped));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL at DATABASE_URL - run with --ignored"]
    async fn draft_gets_its_stamp_on_first_publish(pool: PgPool) {
        let db = DBClient::new(pool);
        let author_id = editor(&db).await;

        let post = db
            .create_post(author_id, fields("Bản nháp", PostStatus::Draft), None)
            .await
            .unwrap();
        assert_eq!(post.published_at, None);

        let published = db
            .update_post(post.id, fields("Bản nháp", PostStatus::Published), Some(Utc::now()))
            .await
            .unwrap();
        assert!(published.published_at.is_some());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL at DATABASE_URL - run with --ignored"]
    async fn unknown_category_is_a_foreign_key_violation(pool: PgPool) {
        let db = DBClient::new(pool);
        let author_id = editor(&db).await;

        let mut body = fields("Tin lạc danh mục", PostStatus::Draft);
        body.category_id = Some(9_999);
        let err = db.create_post(author_id, body, None).await.unwrap_err();

        let http = crate::error::db_error("create_post", "bài viết")(err);
        assert_eq!(http.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
