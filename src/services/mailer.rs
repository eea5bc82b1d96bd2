use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{Error, Result};
use crate::models::smtp_settings::SmtpSettings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivery boundary for outgoing mail.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<()>;
}

/// Sends through the SMTP relay configured in `smtp_settings`. Settings are
/// read per message so edits take effect without a restart.
#[derive(Clone)]
pub struct SmtpMailer {
    pool: PgPool,
}

impl SmtpMailer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn settings(&self) -> Result<SmtpSettings> {
        let settings = sqlx::query_as::<_, SmtpSettings>(
            r#"
            SELECT host, port, username, password, from_address, enabled, updated_at
            FROM smtp_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        match settings {
            Some(s) if s.enabled => Ok(s),
            Some(_) => Err(Error::Delivery("SMTP delivery is disabled".into())),
            None => Err(Error::Delivery("SMTP is not configured".into())),
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        let settings = self.settings().await?;

        let from: Mailbox = settings
            .from_address
            .parse()
            .map_err(|e| Error::Delivery(format!("invalid sender address: {}", e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| Error::Delivery(format!("invalid recipient address: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| Error::Delivery(e.to_string()))?;

        let port = u16::try_from(settings.port)
            .map_err(|_| Error::Delivery(format!("invalid SMTP port {}", settings.port)))?;
        // 465 is implicit TLS, everything else negotiates STARTTLS.
        let builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| Error::Delivery(e.to_string()))?
        .port(port);

        let builder = if settings.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
        };

        builder
            .build()
            .send(message)
            .await
            .map_err(|e| Error::Delivery(e.to_string()))?;

        tracing::info!(to = %email.to, subject = %email.subject, "email delivered");
        Ok(())
    }
}

/// Writes mail to the log instead of sending it.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<()> {
        tracing::info!(
            to = %email.to,
            subject = %email.subject,
            body = %email.body,
            "email (log transport)"
        );
        Ok(())
    }
}
