use chrono::Utc;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::application_dto::{RoundEntry, UpdateApplicationPayload};
use crate::error::{Error, ForbiddenReason, Result};
use crate::models::application::{Application, ApplicationView};
use crate::models::jaf::{Candidate, Jaf};
use crate::models::student::Student;
use crate::services::activity_service::ActivityService;
use crate::services::jaf_service::load_jaf;
use crate::services::mail_templates;
use crate::services::notification_service::NotificationService;

const APPLICATION_COLUMNS: &str =
    "id, student_id, jaf_id, status, current_round, remarks, applied_at, updated_at";

const VIEW_SELECT: &str = r#"
    SELECT a.id, a.student_id, s.full_name AS student_name, su.email AS student_email,
           s.roll_number, s.branch, a.jaf_id, j.job_title, c.company_name, a.status,
           a.current_round, a.remarks,
           (SELECT COUNT(*) FROM application_rounds r
             WHERE r.application_id = a.id AND r.status = 'cleared') AS rounds_cleared,
           a.applied_at, a.updated_at
    FROM student_applications a
    JOIN students s ON s.id = a.student_id
    JOIN users su ON su.id = s.user_id
    JOIN job_announcements j ON j.id = a.jaf_id
    JOIN companies c ON c.id = j.company_id
"#;

/// Who is moving an application along. `company_id` is set for company
/// reviewers and limits them to their own announcements.
#[derive(Debug, Clone, Copy)]
pub struct Reviewer {
    pub user_id: Uuid,
    pub company_id: Option<Uuid>,
}

impl Reviewer {
    fn may_review(&self, jaf: &Jaf) -> Result<()> {
        match self.company_id {
            Some(company_id) if company_id != jaf.company_id => {
                Err(Error::Forbidden(ForbiddenReason::NotOwner))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    notifier: NotificationService,
    activity: ActivityService,
}

impl ApplicationService {
    pub fn new(pool: PgPool, notifier: NotificationService, activity: ActivityService) -> Self {
        Self {
            pool,
            notifier,
            activity,
        }
    }

    pub async fn student_for_user(&self, user_id: Uuid) -> Result<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            SELECT s.id, s.user_id, u.email, s.full_name, s.roll_number, s.phone, s.branch,
                   s.year, s.cgpa, s.passing_year, s.degree_type, s.is_email_verified,
                   s.is_verified_by_admin, s.created_at, s.updated_at
            FROM students s
            JOIN users u ON u.id = s.user_id
            WHERE s.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Student profile not found".to_string()))
    }

    /// Checks run in order: announcement accepting, no prior application,
    /// eligibility. The unique (student, jaf) constraint settles races.
    pub async fn apply(&self, student: &Student, jaf_id: Uuid) -> Result<Application> {
        let mut tx = self.pool.begin().await?;
        let jaf = load_jaf(&mut *tx, jaf_id, false).await?;
        jaf.accepting_applications(Utc::now())?;

        let already: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM student_applications WHERE student_id = $1 AND jaf_id = $2)",
        )
        .bind(student.id)
        .bind(jaf_id)
        .fetch_one(&mut *tx)
        .await?;
        if already {
            return Err(Error::conflict(
                "duplicate_application",
                "You have already applied to this job",
            ));
        }

        jaf.criteria().check(&Candidate {
            passing_year: student.passing_year,
            branch: &student.branch,
            degree_type: &student.degree_type,
        })?;

        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO student_applications (student_id, jaf_id, status, current_round)
            VALUES ($1, $2, 'applied', 1)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(student.id)
        .bind(jaf_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(
            application_id = %application.id,
            student_id = %student.id,
            %jaf_id,
            "application submitted"
        );
        self.notifier
            .notify(mail_templates::application_received(
                &student.email,
                &student.full_name,
                &jaf.job_title,
                &jaf.company_name,
            ))
            .await;
        self.activity
            .record(
                Some(student.user_id),
                "application_submitted",
                json!({ "application_id": application.id, "jaf_id": jaf_id }),
            )
            .await;
        Ok(application)
    }

    /// Moves an application of `jaf_id` forward, optionally appending a round
    /// to the ledger.
    pub async fn update_status(
        &self,
        jaf_id: Uuid,
        payload: UpdateApplicationPayload,
        reviewer: Reviewer,
    ) -> Result<Application> {
        let mut tx = self.pool.begin().await?;
        let jaf = load_jaf(&mut *tx, jaf_id, false).await?;
        reviewer.may_review(&jaf)?;

        let current = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM student_applications WHERE id = $1 AND jaf_id = $2 FOR UPDATE",
            APPLICATION_COLUMNS
        ))
        .bind(payload.application_id)
        .bind(jaf_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;

        let round = plan_round(&jaf, &current, &payload)?;
        let remarks = payload.remarks.or_else(|| current.remarks.clone());

        let updated = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE student_applications
            SET status = $2, current_round = $3, remarks = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(current.id)
        .bind(payload.status.as_str())
        .bind(round)
        .bind(&remarks)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(entry) = &payload.round {
            record_round(&mut *tx, current.id, entry).await?;
        }
        tx.commit().await?;

        tracing::info!(
            application_id = %updated.id,
            from = %current.status,
            to = %updated.status,
            current_round = updated.current_round,
            reviewer = %reviewer.user_id,
            "application status changed"
        );

        if let Some((email, name)) = self.student_contact(updated.student_id).await {
            self.notifier
                .notify(mail_templates::application_status_changed(
                    &email,
                    &name,
                    &jaf.job_title,
                    updated.status,
                    remarks.as_deref(),
                ))
                .await;
        }
        self.activity
            .record(
                Some(reviewer.user_id),
                "application_status_changed",
                json!({
                    "application_id": updated.id,
                    "jaf_id": jaf_id,
                    "from": current.status,
                    "to": updated.status,
                    "current_round": updated.current_round,
                }),
            )
            .await;
        Ok(updated)
    }

    async fn student_contact(&self, student_id: Uuid) -> Option<(String, String)> {
        let contact = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT u.email, s.full_name
            FROM students s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1
            "#,
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await;
        match contact {
            Ok(contact) => contact,
            Err(err) => {
                tracing::warn!(error = %err, %student_id, "failed to load student contact");
                None
            }
        }
    }

    pub async fn list_for_jaf(
        &self,
        jaf_id: Uuid,
        reviewer: Reviewer,
    ) -> Result<Vec<ApplicationView>> {
        let jaf = {
            let mut conn = self.pool.acquire().await?;
            load_jaf(&mut *conn, jaf_id, false).await?
        };
        reviewer.may_review(&jaf)?;

        let rows = sqlx::query_as::<_, ApplicationView>(&format!(
            "{} WHERE a.jaf_id = $1 ORDER BY a.applied_at ASC",
            VIEW_SELECT
        ))
        .bind(jaf_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<ApplicationView>> {
        let rows = sqlx::query_as::<_, ApplicationView>(&format!(
            "{} WHERE a.student_id = $1 ORDER BY a.applied_at DESC",
            VIEW_SELECT
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

/// Validates the requested change and returns the round the application
/// will sit on.
fn plan_round(jaf: &Jaf, current: &Application, payload: &UpdateApplicationPayload) -> Result<i32> {
    let from_entry = payload
        .round
        .as_ref()
        .map(|r| r.round_number)
        .filter(|n| *n > current.current_round);
    let requested = payload.current_round.or(from_entry);
    let round = current.plan_update(payload.status, requested)?;
    if round > jaf.total_rounds {
        return Err(Error::BadRequest(format!(
            "round {} exceeds the {} rounds of this job",
            round, jaf.total_rounds
        )));
    }
    if let Some(entry) = &payload.round {
        if entry.round_number > jaf.total_rounds {
            return Err(Error::BadRequest(format!(
                "round {} exceeds the {} rounds of this job",
                entry.round_number, jaf.total_rounds
            )));
        }
    }
    Ok(round)
}

async fn record_round(
    conn: &mut PgConnection,
    application_id: Uuid,
    entry: &RoundEntry,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO application_rounds (application_id, round_number, round_type, status, remarks)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(application_id)
    .bind(entry.round_number)
    .bind(entry.round_type.trim())
    .bind(entry.status.as_str())
    .bind(&entry.remarks)
    .execute(&mut *conn)
    .await?;
    Ok(())
}
