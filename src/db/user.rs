use super::DBClient;
use crate::models::{ActiveStatus, User, UserRole};

/// Column fields for an account being written; `password_hash` is already hashed.
pub struct UserFields<'a> {
    pub email: &'a str,
    pub full_name: Option<&'a str>,
    pub avatar: Option<&'a str>,
    pub role: UserRole,
    pub status: ActiveStatus,
}

/// User database operations trait
pub trait UserExt {
    /// Get single user by ID, username, or email
    /// Returns Option - Some(user) if found, None if not found
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    /// All accounts, newest first
    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error>;

    async fn save_user(
        &self,
        username: &str,
        password_hash: &str,
        fields: UserFields<'_>,
    ) -> Result<User, sqlx::Error>;

    /// `password_hash = None` keeps the stored hash
    async fn update_user(
        &self,
        user_id: i64,
        password_hash: Option<&str>,
        fields: UserFields<'_>,
    ) -> Result<User, sqlx::Error>;

    async fn delete_user(&self, user_id: i64) -> Result<(), sqlx::Error>;

    async fn get_user_count(&self) -> Result<i64, sqlx::Error>;

    /// True when another account already uses `email`
    async fn email_taken_by_other(&self, user_id: i64, email: &str) -> Result<bool, sqlx::Error>;
}

impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<i64>,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(username) = username {
            user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        }

        Ok(user)
    }

    async fn get_users(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
    }

    async fn save_user(
        &self,
        username: &str,
        password_hash: &str,
        fields: UserFields<'_>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, full_name, avatar, role, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(fields.email)
        .bind(password_hash)
        .bind(fields.full_name)
        .bind(fields.avatar)
        .bind(fields.role)
        .bind(fields.status)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user(
        &self,
        user_id: i64,
        password_hash: Option<&str>,
        fields: UserFields<'_>,
    ) -> Result<User, sqlx::Error> {
        // fetch_one turns a missing id into RowNotFound
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $2,
                password_hash = COALESCE($3, password_hash),
                full_name = $4,
                avatar = $5,
                role = $6,
                status = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(fields.email)
        .bind(password_hash)
        .bind(fields.full_name)
        .bind(fields.avatar)
        .bind(fields.role)
        .bind(fields.status)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_user(&self, user_id: i64) -> Result<(), sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        Ok(())
    }

    async fn get_user_count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
    }

    async fn email_taken_by_other(&self, user_id: i64, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
    }
}
