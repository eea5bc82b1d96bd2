use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::admin_dto::UpdateSmtpSettingsPayload;
use crate::error::{Error, Result};
use crate::models::smtp_settings::SmtpSettings;
use crate::services::activity_service::ActivityService;

const SMTP_COLUMNS: &str = "host, port, username, password, from_address, enabled, updated_at";

/// The single `smtp_settings` row the SMTP mailer reads per message.
#[derive(Clone)]
pub struct SettingsService {
    pool: PgPool,
    activity: ActivityService,
}

impl SettingsService {
    pub fn new(pool: PgPool, activity: ActivityService) -> Self {
        Self { pool, activity }
    }

    pub async fn smtp(&self) -> Result<SmtpSettings> {
        sqlx::query_as::<_, SmtpSettings>(&format!(
            "SELECT {} FROM smtp_settings WHERE id = 1",
            SMTP_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("SMTP settings have not been configured".to_string()))
    }

    /// Upserts the row. A missing password keeps the stored one.
    pub async fn update_smtp(
        &self,
        payload: UpdateSmtpSettingsPayload,
        actor: Uuid,
    ) -> Result<SmtpSettings> {
        let settings = sqlx::query_as::<_, SmtpSettings>(&format!(
            r#"
            INSERT INTO smtp_settings (id, host, port, username, password, from_address, enabled)
            VALUES (1, $1, $2, $3, COALESCE($4, ''), $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                host = EXCLUDED.host,
                port = EXCLUDED.port,
                username = EXCLUDED.username,
                password = COALESCE($4, smtp_settings.password),
                from_address = EXCLUDED.from_address,
                enabled = EXCLUDED.enabled,
                updated_at = NOW()
            RETURNING {}
            "#,
            SMTP_COLUMNS
        ))
        .bind(payload.host.trim())
        .bind(payload.port)
        .bind(payload.username.trim())
        .bind(payload.password.as_deref())
        .bind(payload.from_address.trim())
        .bind(payload.enabled)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(host = %settings.host, port = settings.port, enabled = settings.enabled, %actor, "smtp settings updated");
        self.activity
            .record(
                Some(actor),
                "smtp_settings_updated",
                json!({
                    "host": settings.host,
                    "port": settings.port,
                    "enabled": settings.enabled,
                    "password_changed": payload.password.is_some(),
                }),
            )
            .await;
        Ok(settings)
    }
}
