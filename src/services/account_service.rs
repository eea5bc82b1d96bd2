use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, ForbiddenReason, Result};
use crate::models::role::Role;
use crate::models::user::User;
use crate::services::activity_service::ActivityService;

#[derive(Clone)]
pub struct AccountService {
    pool: PgPool,
    activity: ActivityService,
}

/// Only a SuperAdmin may change another SuperAdmin's account.
pub fn may_change_activation(actor: Role, target: Role) -> bool {
    actor.is_admin() && (target != Role::SuperAdmin || actor == Role::SuperAdmin)
}

impl AccountService {
    pub fn new(pool: PgPool, activity: ActivityService) -> Self {
        Self { pool, activity }
    }

    pub async fn set_active(
        &self,
        user_id: Uuid,
        is_active: bool,
        actor: Uuid,
        actor_role: Role,
    ) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let target = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, is_verified, is_active, created_at, updated_at
            FROM users WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        if !may_change_activation(actor_role, target.role) {
            return Err(Error::Forbidden(ForbiddenReason::Role));
        }
        if target.id == actor && !is_active {
            return Err(Error::BadRequest("You cannot deactivate your own account".to_string()));
        }

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, role, is_verified, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(%user_id, is_active, %actor, "user activation changed");
        self.activity
            .record(
                Some(actor),
                "user_activation_changed",
                json!({ "user_id": user_id, "from": target.is_active, "to": is_active }),
            )
            .await;
        Ok(user)
    }
}
