use crate::error::Result;
use crate::models::email_outbox::{retry_backoff, EmailOutbox, DEFAULT_MAX_ATTEMPTS};
use crate::services::mailer::{Mailer, OutgoingEmail};
use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;

const OUTBOX_COLUMNS: &str = r#"
    id, recipient, subject, body, status, attempts, max_attempts,
    next_retry_at, last_error, created_at, updated_at
"#;

/// Email notifier. Transition mail goes through the `email_outbox` table and is
/// delivered by the background worker; OTP mail is sent inline.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    mailer: Arc<dyn Mailer>,
}

impl NotificationService {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>) -> Self {
        Self { pool, mailer }
    }

    pub async fn enqueue(&self, email: &OutgoingEmail) -> Result<EmailOutbox> {
        let row = sqlx::query_as::<_, EmailOutbox>(&format!(
            r#"
            INSERT INTO email_outbox (recipient, subject, body, status, max_attempts)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING {}
            "#,
            OUTBOX_COLUMNS
        ))
        .bind(&email.to)
        .bind(&email.subject)
        .bind(&email.body)
        .bind(DEFAULT_MAX_ATTEMPTS)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Post-commit notification. Never fails the caller.
    pub async fn notify(&self, email: OutgoingEmail) {
        if let Err(err) = self.enqueue(&email).await {
            tracing::warn!(
                error = %err,
                to = %email.to,
                subject = %email.subject,
                "failed to enqueue notification"
            );
        }
    }

    pub async fn send_now(&self, email: &OutgoingEmail) -> Result<()> {
        self.mailer.send(email).await
    }

    /// Delivers at most one due message. Returns `false` when nothing was due.
    pub async fn run_once(&self) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let due = sqlx::query_as::<_, EmailOutbox>(&format!(
            r#"
            SELECT {}
            FROM email_outbox
            WHERE status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= NOW())
            ORDER BY created_at ASC
            FOR UPDATE SKIP LOCKED
            LIMIT 1
            "#,
            OUTBOX_COLUMNS
        ))
        .fetch_optional(&mut *tx)
        .await?;

        let Some(message) = due else {
            tx.commit().await?;
            return Ok(false);
        };

        let email = OutgoingEmail {
            to: message.recipient.clone(),
            subject: message.subject.clone(),
            body: message.body.clone(),
        };

        match self.mailer.send(&email).await {
            Ok(()) => {
                sqlx::query(
                    r#"
                    UPDATE email_outbox
                    SET status = 'sent', attempts = attempts + 1, last_error = NULL, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(message.id)
                .execute(&mut *tx)
                .await?;
            }
            Err(err) => {
                let attempts = message.attempts + 1;
                let exhausted = attempts >= message.max_attempts;
                let next_retry_at = (!exhausted).then(|| Utc::now() + retry_backoff(attempts));
                tracing::warn!(
                    error = %err,
                    outbox_id = %message.id,
                    attempts,
                    exhausted,
                    "email delivery failed"
                );
                sqlx::query(
                    r#"
                    UPDATE email_outbox
                    SET status = $2, attempts = $3, next_retry_at = $4, last_error = $5, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(message.id)
                .bind(if exhausted { "failed" } else { "pending" })
                .bind(attempts)
                .bind(next_retry_at)
                .bind(err.to_string())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Drains every due message. Returns how many were processed.
    pub async fn drain(&self) -> Result<usize> {
        let mut processed = 0;
        while self.run_once().await? {
            processed += 1;
        }
        Ok(processed)
    }

    pub async fn purge_sent(&self, older_than_days: i32) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM email_outbox
            WHERE status = 'sent' AND updated_at < NOW() - make_interval(days => $1)
            "#,
        )
        .bind(older_than_days)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::services::mailer::MockMailer;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn send_now_surfaces_delivery_failure() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(1)
            .returning(|_| Err(Error::Delivery("connection refused".into())));
        let service = NotificationService::new(lazy_pool(), Arc::new(mailer));

        let email = OutgoingEmail {
            to: "a@x.edu".into(),
            subject: "code".into(),
            body: "123456".into(),
        };
        let err = service.send_now(&email).await.unwrap_err();
        assert_eq!(err.code(), "delivery_failed");
    }

    #[tokio::test]
    async fn send_now_passes_the_message_through() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| email.to == "a@x.edu" && email.body.contains("123456"))
            .times(1)
            .returning(|_| Ok(()));
        let service = NotificationService::new(lazy_pool(), Arc::new(mailer));

        let email = OutgoingEmail {
            to: "a@x.edu".into(),
            subject: "code".into(),
            body: "123456".into(),
        };
        service.send_now(&email).await.unwrap();
    }
}
