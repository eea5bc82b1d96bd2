use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_MAX_ATTEMPTS: i32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmailOutbox {
    pub id: Uuid,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Delay before the next delivery attempt: 30s doubling per attempt, capped at
/// one hour.
pub fn retry_backoff(attempts: i32) -> Duration {
    let exponent = (attempts - 1).clamp(0, 16) as u32;
    let secs = 30i64.saturating_mul(2i64.pow(exponent));
    Duration::seconds(secs.min(3600))
}
