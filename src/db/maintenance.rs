use super::{DBClient, PostExt, ProjectExt, UserExt, UserFields};
use crate::config::AdminBootstrap;
use crate::models::{ActiveStatus, UserRole};
use crate::utils::password;

impl DBClient {
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// One-off fixes run before the server starts accepting requests.
    pub async fn run_startup_maintenance(&self, bootstrap: Option<&AdminBootstrap>) {
        match self.backfill_post_published_at().await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Backfilled published_at on {} posts", n),
            Err(e) => tracing::error!("Backfilling post published_at failed: {}", e),
        }

        match self.backfill_project_published_at().await {
            Ok(0) => {}
            Ok(n) => tracing::info!("Backfilled published_at on {} projects", n),
            Err(e) => tracing::error!("Backfilling project published_at failed: {}", e),
        }

        if let Some(admin) = bootstrap {
            if let Err(e) = self.bootstrap_admin(admin).await {
                tracing::error!("Admin bootstrap failed: {}", e);
            }
        }
    }

    /// Creates the first administrator when there are no accounts at all.
    async fn bootstrap_admin(&self, admin: &AdminBootstrap) -> Result<(), String> {
        let count = self.get_user_count().await.map_err(|e| e.to_string())?;
        if count > 0 {
            tracing::debug!("Users exist, skipping admin bootstrap");
            return Ok(());
        }

        let password_hash = password::hash(admin.password.as_str()).map_err(|e| e.to_string())?;

        let user = self
            .save_user(
                &admin.username,
                &password_hash,
                UserFields {
                    email: &admin.email,
                    full_name: Some("Administrator"),
                    avatar: None,
                    role: UserRole::Admin,
                    status: ActiveStatus::Active,
                },
            )
            .await
            .map_err(|e| e.to_string())?;

        tracing::info!(user_id = user.id, username = %user.username, "Bootstrap administrator created");
        Ok(())
    }
}
