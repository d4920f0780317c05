use super::DBClient;
use crate::dtos::{FeedbackDto, FeedbackRow};
use crate::models::{Feedback, FeedbackStatus};
use chrono::{DateTime, Utc};

const SELECT_FEEDBACK_ROW: &str = r#"
    SELECT f.*, u.full_name AS replier_full_name, u.email AS replier_email
    FROM feedback f
    LEFT JOIN users u ON f.replied_by = u.id
"#;

pub trait FeedbackExt {
    /// Pending first, then newest
    async fn get_feedback_list(
        &self,
        status: Option<FeedbackStatus>,
    ) -> Result<Vec<FeedbackDto>, sqlx::Error>;

    async fn get_feedback(&self, feedback_id: i64) -> Result<FeedbackDto, sqlx::Error>;

    async fn create_feedback(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        subject: &str,
        message: &str,
    ) -> Result<Feedback, sqlx::Error>;

    /// `None` stamps leave `replied_at` / `replied_by` untouched
    async fn reply_feedback(
        &self,
        feedback_id: i64,
        admin_reply: Option<&str>,
        status: FeedbackStatus,
        replied_at: Option<DateTime<Utc>>,
        replied_by: Option<i64>,
    ) -> Result<Feedback, sqlx::Error>;

    async fn delete_feedback(&self, feedback_id: i64) -> Result<(), sqlx::Error>;

    /// Most recently answered items for the public page
    async fn get_answered_feedback(&self, limit: i64) -> Result<Vec<Feedback>, sqlx::Error>;
}

impl FeedbackExt for DBClient {
    async fn get_feedback_list(
        &self,
        status: Option<FeedbackStatus>,
    ) -> Result<Vec<FeedbackDto>, sqlx::Error> {
        let sql = format!(
            "{SELECT_FEEDBACK_ROW} WHERE ($1::feedback_status IS NULL OR f.status = $1) ORDER BY f.status ASC, f.created_at DESC"
        );
        let rows = sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(FeedbackDto::from).collect())
    }

    async fn get_feedback(&self, feedback_id: i64) -> Result<FeedbackDto, sqlx::Error> {
        let sql = format!("{SELECT_FEEDBACK_ROW} WHERE f.id = $1");
        let row = sqlx::query_as::<_, FeedbackRow>(&sql)
            .bind(feedback_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn create_feedback(
        &self,
        name: &str,
        email: &str,
        phone: Option<&str>,
        subject: &str,
        message: &str,
    ) -> Result<Feedback, sqlx::Error> {
        sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (name, email, phone, subject, message, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(subject)
        .bind(message)
        .fetch_one(&self.pool)
        .await
    }

    async fn reply_feedback(
        &self,
        feedback_id: i64,
        admin_reply: Option<&str>,
        status: FeedbackStatus,
        replied_at: Option<DateTime<Utc>>,
        replied_by: Option<i64>,
    ) -> Result<Feedback, sqlx::Error> {
        sqlx::query_as::<_, Feedback>(
            r#"
            UPDATE feedback
            SET admin_reply = $2,
                status = $3,
                replied_at = COALESCE($4, replied_at),
                replied_by = COALESCE($5, replied_by),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(feedback_id)
        .bind(admin_reply)
        .bind(status)
        .bind(replied_at)
        .bind(replied_by)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_feedback(&self, feedback_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = $1")
            .bind(feedback_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_answered_feedback(&self, limit: i64) -> Result<Vec<Feedback>, sqlx::Error> {
        sqlx::query_as::<_, Feedback>(
            r#"
            SELECT * FROM feedback
            WHERE status = 'answered' AND admin_reply IS NOT NULL
            ORDER BY replied_at DESC NULLS LAST, created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{UserExt, UserFields};
    use crate::handler::feedback::reply_stamp;
    use crate::models::{ActiveStatus, UserRole};
    use sqlx::PgPool;

    async fn admin(db: &DBClient, username: &str, email: &str) -> i64 {
        db.save_user(
            username,
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA",
            UserFields {
                email,
                full_name: Some("Quản trị"),
                avatar: None,
                role: UserRole::Admin,
                status: ActiveStatus::Active,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn reply(
        db: &DBClient,
        feedback_id: i64,
        admin_reply: Option<&str>,
        status: FeedbackStatus,
        replier_id: i64,
    ) -> Feedback {
        let (replied_at, replied_by) = reply_stamp(admin_reply, status, replier_id, Utc::now());
        db.reply_feedback(feedback_id, admin_reply, status, replied_at, replied_by)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL at DATABASE_URL - run with --ignored"]
    async fn archiving_an_answer_keeps_reply_stamps(pool: PgPool) {
        let db = DBClient::new(pool);
        let first_admin = admin(&db, "quantri", "quantri@example.vn").await;
        let second_admin = admin(&db, "quantri2", "quantri2@example.vn").await;

        let feedback = db
            .create_feedback("Nguyễn Văn A", "dan@example.vn", None, "Góp ý", "Nội dung")
            .await
            .unwrap();
        assert_eq!(feedback.status, FeedbackStatus::Pending);
        assert_eq!(feedback.replied_at, None);

        let answered = reply(
            &db,
            feedback.id,
            Some("Cảm ơn góp ý"),
            FeedbackStatus::Answered,
            first_admin,
        )
        .await;
        assert!(answered.replied_at.is_some());
        assert_eq!(answered.replied_by, Some(first_admin));

        let archived = reply(
            &db,
            feedback.id,
            Some("Cảm ơn góp ý"),
            FeedbackStatus::Archived,
            second_admin,
        )
        .await;
        assert_eq!(archived.status, FeedbackStatus::Archived);
        assert_eq!(archived.replied_at, answered.replied_at);
        assert_eq!(archived.replied_by, Some(first_admin));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL at DATABASE_URL - run with --ignored"]
    async fn answering_without_a_reply_leaves_stamps_empty(pool: PgPool) {
        let db = DBClient::new(pool);
        let admin_id = admin(&db, "quantri", "quantri@example.vn").await;

        let feedback = db
            .create_feedback("Trần Thị B", "b@example.vn", None, "Hỏi", "Câu hỏi")
            .await
            .unwrap();
        let updated = reply(&db, feedback.id, None, FeedbackStatus::Answered, admin_id).await;

        assert_eq!(updated.replied_at, None);
        assert_eq!(updated.replied_by, None);
    }
}
