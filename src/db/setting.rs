use super::DBClient;
use crate::dtos::UpdateSettingsDto;
use crate::models::Setting;

const DEFAULT_SITE_NAME: &str = "Cổng Thông Tin Quy Hoạch Quốc Gia";
const DEFAULT_FOOTER_ABOUT: &str =
    "Cổng thông tin điện tử về quy hoạch quốc gia, cung cấp thông tin về các dự án quy hoạch, tin tức và văn bản pháp luật liên quan.";
const DEFAULT_CONTACT_EMAIL: &str = "info@domain.example";
const DEFAULT_CONTACT_PHONE: &str = "(84) 24 1234 5678";
const DEFAULT_FOOTER_COPYRIGHT: &str = "Bộ Kế hoạch và Đầu tư";

pub trait SettingExt {
    /// The first settings row, inserting the defaults when the table is empty
    async fn get_settings(&self) -> Result<Setting, sqlx::Error>;

    async fn update_settings(
        &self,
        setting_id: i64,
        body: &UpdateSettingsDto,
    ) -> Result<Setting, sqlx::Error>;
}

impl SettingExt for DBClient {
    async fn get_settings(&self) -> Result<Setting, sqlx::Error> {
        let existing = sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY id ASC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        if let Some(setting) = existing {
            return Ok(setting);
        }

        tracing::info!("No settings row found, creating defaults");

        // A concurrent first request may win the insert; the singleton index
        // turns ours into a no-op and both read the same row.
        sqlx::query(
            r#"
            INSERT INTO settings (site_name, footer_about, contact_email, contact_phone, footer_copyright)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(DEFAULT_SITE_NAME)
        .bind(DEFAULT_FOOTER_ABOUT)
        .bind(DEFAULT_CONTACT_EMAIL)
        .bind(DEFAULT_CONTACT_PHONE)
        .bind(DEFAULT_FOOTER_COPYRIGHT)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, Setting>("SELECT * FROM settings ORDER BY id ASC LIMIT 1")
            .fetch_one(&self.pool)
            .await
    }

    async fn update_settings(
        &self,
        setting_id: i64,
        body: &UpdateSettingsDto,
    ) -> Result<Setting, sqlx::Error> {
        sqlx::query_as::<_, Setting>(
            r#"
            UPDATE settings
            SET site_name = $2, site_logo = $3, site_favicon = $4, footer_about = $5,
                contact_email = $6, contact_phone = $7, contact_address = $8,
                facebook_url = $9, youtube_url = $10, footer_copyright = $11,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(setting_id)
        .bind(&body.site_name)
        .bind(&body.site_logo)
        .bind(&body.site_favicon)
        .bind(&body.footer_about)
        .bind(&body.contact_email)
        .bind(&body.contact_phone)
        .bind(&body.contact_address)
        .bind(&body.facebook_url)
        .bind(&body.youtube_url)
        .bind(&body.footer_copyright)
        .fetch_one(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires PostgreSQL at DATABASE_URL - run with --ignored"]
    async fn concurrent_first_reads_create_one_row(pool: PgPool) {
        let db = DBClient::new(pool.clone());

        let (a, b) = tokio::join!(db.get_settings(), db.get_settings());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_eq!(a.id, b.id);
        assert_eq!(a.site_name, DEFAULT_SITE_NAME);

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM settings")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
