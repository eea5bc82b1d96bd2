use crate::error::Result;
use crate::models::activity_log::ActivityLog;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ActivityService {
    pool: PgPool,
}

impl ActivityService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        details: Option<JsonValue>,
    ) -> Result<ActivityLog> {
        let row = sqlx::query_as::<_, ActivityLog>(
            r#"
            INSERT INTO activity_logs (user_id, action, details)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, action, details, created_at
            "#,
        )
        .bind(user_id)
        .bind(action)
        .bind(details)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Written after the audited change has committed; a failed write is logged
    /// and otherwise ignored.
    pub async fn record(&self, user_id: Option<Uuid>, action: &str, details: JsonValue) {
        if let Err(err) = self.log(user_id, action, Some(details)).await {
            tracing::warn!(error = %err, action, "failed to write activity log");
        }
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<ActivityLog>> {
        let rows = sqlx::query_as::<_, ActivityLog>(
            r#"
            SELECT id, user_id, action, details, created_at
            FROM activity_logs
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 500))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
