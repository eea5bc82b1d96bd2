use chrono::{Duration, Utc};
use serde_json::Value as JsonValue;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::otp::{OtpPurpose, OtpRecord, OtpRejection};
use crate::services::{mail_templates, notification_service::NotificationService};
use crate::utils::otp::{generate_code, hash_code};

const OTP_COLUMNS: &str =
    "id, email, code_hash, purpose, expires_at, used, pending_payload, created_at";

/// Ledger of one-time codes bound to an email and a purpose. The newest row
/// for a pair is the authoritative one.
#[derive(Clone)]
pub struct OtpService {
    pool: PgPool,
    notifier: NotificationService,
    secret: String,
    ttl_minutes: i64,
}

impl OtpService {
    pub fn new(pool: PgPool, notifier: NotificationService, secret: String, ttl_minutes: i64) -> Self {
        Self {
            pool,
            notifier,
            secret,
            ttl_minutes,
        }
    }

    /// Writes a fresh code and only then mails it. A delivery failure is
    /// returned to the caller; the row stays so a resend can follow.
    pub async fn issue(
        &self,
        email: &str,
        purpose: OtpPurpose,
        pending_payload: Option<JsonValue>,
    ) -> Result<OtpRecord> {
        let code = generate_code();
        let record = sqlx::query_as::<_, OtpRecord>(&format!(
            r#"
            INSERT INTO otps (email, code_hash, purpose, expires_at, pending_payload)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            OTP_COLUMNS
        ))
        .bind(email)
        .bind(hash_code(&self.secret, email, purpose, &code)?)
        .bind(purpose.as_str())
        .bind(Utc::now() + Duration::minutes(self.ttl_minutes))
        .bind(pending_payload)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(email, purpose = %purpose, otp_id = %record.id, "otp issued");

        let mail = mail_templates::otp(email, purpose, &code, self.ttl_minutes);
        if let Err(err) = self.notifier.send_now(&mail).await {
            tracing::warn!(error = %err, email, purpose = %purpose, "otp delivery failed");
            return Err(err);
        }
        Ok(record)
    }

    /// Issues a new code, carrying forward the most recent staged payload for
    /// the pair if there is one.
    pub async fn reissue(&self, email: &str, purpose: OtpPurpose) -> Result<OtpRecord> {
        let payload = sqlx::query_scalar::<_, Option<JsonValue>>(
            r#"
            SELECT pending_payload
            FROM otps
            WHERE email = $1 AND purpose = $2 AND pending_payload IS NOT NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?
        .flatten();

        if payload.is_none() {
            tracing::debug!(email, purpose = %purpose, "no staged payload to carry forward");
        }
        self.issue(email, purpose, payload).await
    }

    pub async fn latest(
        &self,
        conn: &mut PgConnection,
        email: &str,
        purpose: OtpPurpose,
    ) -> Result<Option<OtpRecord>> {
        let record = sqlx::query_as::<_, OtpRecord>(&format!(
            r#"
            SELECT {}
            FROM otps
            WHERE email = $1 AND purpose = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            OTP_COLUMNS
        ))
        .bind(email)
        .bind(purpose.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(record)
    }

    /// Looks up the authoritative code for the pair and checks the presented
    /// one against it. Nothing is written.
    pub async fn check(
        &self,
        conn: &mut PgConnection,
        email: &str,
        purpose: OtpPurpose,
        code: &str,
    ) -> Result<OtpRecord> {
        let record = self
            .latest(conn, email, purpose)
            .await?
            .ok_or(OtpRejection::NotFound)?;
        let presented = hash_code(&self.secret, email, purpose, code)?;
        record.check(&presented, Utc::now())?;
        Ok(record)
    }

    /// Marks the code used. Loses to a concurrent consumer with `AlreadyUsed`.
    pub async fn consume(&self, conn: &mut PgConnection, otp_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE otps SET used = TRUE WHERE id = $1 AND used = FALSE")
            .bind(otp_id)
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(OtpRejection::AlreadyUsed.into());
        }
        Ok(())
    }

    /// Removes codes that expired more than `grace_days` ago.
    pub async fn purge_expired(&self, grace_days: i32) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM otps WHERE expires_at < NOW() - make_interval(days => $1)",
        )
        .bind(grace_days)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
