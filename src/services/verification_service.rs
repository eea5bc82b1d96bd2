use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::company::Company;
use crate::models::student::Student;
use crate::models::transition::TransitionError;
use crate::services::activity_service::ActivityService;
use crate::services::mail_templates;
use crate::services::notification_service::NotificationService;

const STUDENT_COLUMNS: &str = r#"
    s.id, s.user_id, u.email, s.full_name, s.roll_number, s.phone, s.branch, s.year,
    s.cgpa, s.passing_year, s.degree_type, s.is_email_verified, s.is_verified_by_admin,
    s.created_at, s.updated_at
"#;

const COMPANY_COLUMNS: &str = r#"
    c.id, c.user_id, u.email, c.company_name, c.website, c.description, c.contact_person,
    c.phone, c.is_email_verified, c.is_verified_by_admin, c.rejected_at, c.rejection_reason,
    c.created_at, c.updated_at
"#;

/// Role profile that goes through admin review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Student,
    Company,
}

impl ProfileKind {
    fn table(&self) -> &'static str {
        match self {
            ProfileKind::Student => "students",
            ProfileKind::Company => "companies",
        }
    }

    fn name_column(&self) -> &'static str {
        match self {
            ProfileKind::Student => "full_name",
            ProfileKind::Company => "company_name",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ProfileKind::Student => "student",
            ProfileKind::Company => "company",
        }
    }
}

/// Who a profile belongs to, for mail and audit.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProfileOwner {
    user_id: Uuid,
    email: String,
    name: String,
    is_verified_by_admin: bool,
}

/// Admin gate between email verification and login.
#[derive(Clone)]
pub struct VerificationService {
    pool: PgPool,
    notifier: NotificationService,
    activity: ActivityService,
}

impl VerificationService {
    pub fn new(pool: PgPool, notifier: NotificationService, activity: ActivityService) -> Self {
        Self {
            pool,
            notifier,
            activity,
        }
    }

    pub async fn pending_students(&self) -> Result<Vec<Student>> {
        let rows = sqlx::query_as::<_, Student>(&format!(
            r#"
            SELECT {}
            FROM students s
            JOIN users u ON u.id = s.user_id
            WHERE s.is_email_verified = TRUE AND s.is_verified_by_admin = FALSE
            ORDER BY s.created_at ASC
            "#,
            STUDENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn pending_companies(&self) -> Result<Vec<Company>> {
        let rows = sqlx::query_as::<_, Company>(&format!(
            r#"
            SELECT {}
            FROM companies c
            JOIN users u ON u.id = c.user_id
            WHERE c.is_email_verified = TRUE AND c.is_verified_by_admin = FALSE
            ORDER BY c.created_at ASC
            "#,
            COMPANY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn owner(&self, kind: ProfileKind, profile_id: Uuid) -> Result<ProfileOwner> {
        sqlx::query_as::<_, ProfileOwner>(&format!(
            r#"
            SELECT p.user_id, u.email, p.{} AS name, p.is_verified_by_admin
            FROM {} p
            JOIN users u ON u.id = p.user_id
            WHERE p.id = $1
            "#,
            kind.name_column(),
            kind.table()
        ))
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("{} profile not found", kind.label())))
    }

    /// Why a conditional write on the profile matched no row.
    async fn refusal_after_race(&self, kind: ProfileKind, profile_id: Uuid) -> Error {
        match self.owner(kind, profile_id).await {
            Ok(owner) if owner.is_verified_by_admin => TransitionError::AlreadyVerified.into(),
            Ok(_) => Error::NotFound(format!("{} profile not found", kind.label())),
            Err(err) => err,
        }
    }

    /// Sets the admin-verified flag. A soft rejection is cleared.
    pub async fn verify(&self, kind: ProfileKind, profile_id: Uuid, actor: Uuid) -> Result<()> {
        let owner = self.owner(kind, profile_id).await?;
        if owner.is_verified_by_admin {
            return Err(TransitionError::AlreadyVerified.into());
        }

        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET is_verified_by_admin = TRUE, rejected_at = NULL, rejection_reason = NULL,
                updated_at = NOW()
            WHERE id = $1 AND is_verified_by_admin = FALSE
            "#,
            kind.table()
        ))
        .bind(profile_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(TransitionError::AlreadyVerified.into());
        }

        tracing::info!(%profile_id, kind = kind.label(), %actor, "profile verified");
        self.notifier
            .notify(mail_templates::account_verified(&owner.email, &owner.name))
            .await;
        self.activity
            .record(
                Some(actor),
                &format!("{}_verified", kind.label()),
                json!({ "profile_id": profile_id, "user_id": owner.user_id }),
            )
            .await;
        Ok(())
    }

    /// Deletes the profile and its user outright.
    pub async fn hard_reject_and_purge(
        &self,
        kind: ProfileKind,
        profile_id: Uuid,
        actor: Uuid,
        remarks: Option<&str>,
    ) -> Result<()> {
        let owner = self.owner(kind, profile_id).await?;
        if owner.is_verified_by_admin {
            return Err(TransitionError::AlreadyVerified.into());
        }

        // A verify committed after the read above wins.
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(&format!(
            "DELETE FROM {} WHERE id = $1 AND is_verified_by_admin = FALSE",
            kind.table()
        ))
        .bind(profile_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(self.refusal_after_race(kind, profile_id).await);
        }
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(owner.user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(%profile_id, kind = kind.label(), %actor, "profile rejected and purged");
        self.notifier
            .notify(mail_templates::account_rejected(&owner.email, &owner.name, remarks))
            .await;
        self.activity
            .record(
                Some(actor),
                &format!("{}_rejected", kind.label()),
                json!({
                    "profile_id": profile_id,
                    "user_id": owner.user_id,
                    "email": owner.email,
                    "purged": true,
                    "remarks": remarks,
                }),
            )
            .await;
        Ok(())
    }

    /// Clears the admin-verified flag and records the rejection. A later
    /// `verify` reverses it.
    pub async fn soft_reject(
        &self,
        kind: ProfileKind,
        profile_id: Uuid,
        actor: Uuid,
        remarks: Option<&str>,
    ) -> Result<()> {
        let owner = self.owner(kind, profile_id).await?;

        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET is_verified_by_admin = FALSE, rejected_at = NOW(), rejection_reason = $2,
                updated_at = NOW()
            WHERE id = $1
            "#,
            kind.table()
        ))
        .bind(profile_id)
        .bind(remarks)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("{} profile not found", kind.label())));
        }

        tracing::info!(%profile_id, kind = kind.label(), %actor, "profile soft-rejected");
        self.notifier
            .notify(mail_templates::account_rejected(&owner.email, &owner.name, remarks))
            .await;
        self.activity
            .record(
                Some(actor),
                &format!("{}_rejected", kind.label()),
                json!({
                    "profile_id": profile_id,
                    "user_id": owner.user_id,
                    "purged": false,
                    "remarks": remarks,
                }),
            )
            .await;
        Ok(())
    }
}
