use chrono::Utc;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::jaf_dto::{CreateJafPayload, JafResponse, StudentJobView};
use crate::error::{Error, ForbiddenReason, Result};
use crate::models::company::Company;
use crate::models::jaf::{Candidate, Jaf, JafStatus, JobStatus};
use crate::models::student::Student;
use crate::services::activity_service::ActivityService;
use crate::services::mail_templates;
use crate::services::notification_service::NotificationService;

pub(crate) const JAF_COLUMNS: &str = r#"
    j.id, j.company_id, c.company_name, u.email AS company_email, j.job_title,
    j.job_description, j.job_location, j.ctc, j.eligible_batches, j.eligible_branches,
    j.eligible_degrees, j.selection_process, j.total_rounds, j.last_date_to_apply,
    j.status, j.job_status, j.rejection_reason, j.moderated_at, j.created_at, j.updated_at
"#;

pub(crate) const JAF_FROM: &str = r#"
    job_announcements j
    JOIN companies c ON c.id = j.company_id
    JOIN users u ON u.id = c.user_id
"#;

/// Loads an announcement on the caller's connection, optionally row-locked.
pub(crate) async fn load_jaf(conn: &mut PgConnection, id: Uuid, lock: bool) -> Result<Jaf> {
    let sql = format!(
        "SELECT {} FROM {} WHERE j.id = $1{}",
        JAF_COLUMNS,
        JAF_FROM,
        if lock { " FOR UPDATE OF j" } else { "" }
    );
    sqlx::query_as::<_, Jaf>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound("Job announcement not found".to_string()))
}

#[derive(Clone)]
pub struct JafService {
    pool: PgPool,
    notifier: NotificationService,
    activity: ActivityService,
    admin_email: Option<String>,
}

impl JafService {
    pub fn new(
        pool: PgPool,
        notifier: NotificationService,
        activity: ActivityService,
        admin_email: Option<String>,
    ) -> Self {
        Self {
            pool,
            notifier,
            activity,
            admin_email,
        }
    }

    pub async fn company_for_user(&self, user_id: Uuid) -> Result<Company> {
        sqlx::query_as::<_, Company>(
            r#"
            SELECT c.id, c.user_id, u.email, c.company_name, c.website, c.description,
                   c.contact_person, c.phone, c.is_email_verified, c.is_verified_by_admin,
                   c.rejected_at, c.rejection_reason, c.created_at, c.updated_at
            FROM companies c
            JOIN users u ON u.id = c.user_id
            WHERE c.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound("Company profile not found".to_string()))
    }

    pub async fn get(&self, id: Uuid) -> Result<Jaf> {
        let mut conn = self.pool.acquire().await?;
        load_jaf(&mut *conn, id, false).await
    }

    pub async fn submit(&self, company: &Company, payload: CreateJafPayload) -> Result<Jaf> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO job_announcements (
                company_id, job_title, job_description, job_location, ctc,
                eligible_batches, eligible_branches, eligible_degrees,
                selection_process, total_rounds, last_date_to_apply, status, job_status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending', 'open')
            RETURNING id
            "#,
        )
        .bind(company.id)
        .bind(payload.job_title.trim())
        .bind(&payload.job_description)
        .bind(payload.job_location.trim())
        .bind(payload.ctc)
        .bind(CreateJafPayload::normalized_set(&payload.eligible_batches))
        .bind(CreateJafPayload::normalized_set(&payload.eligible_branches))
        .bind(CreateJafPayload::normalized_set(&payload.eligible_degrees))
        .bind(&payload.selection_process)
        .bind(payload.total_rounds)
        .bind(payload.last_date_to_apply)
        .fetch_one(&self.pool)
        .await?;

        let jaf = self.get(id).await?;
        tracing::info!(jaf_id = %jaf.id, company_id = %company.id, "jaf submitted");

        match &self.admin_email {
            Some(admin) => {
                self.notifier
                    .notify(mail_templates::jaf_submitted(
                        admin,
                        &company.company_name,
                        &jaf.job_title,
                    ))
                    .await
            }
            None => tracing::debug!(jaf_id = %jaf.id, "no admin notification address configured"),
        }
        self.activity
            .record(
                Some(company.user_id),
                "jaf_submitted",
                json!({ "jaf_id": jaf.id, "job_title": jaf.job_title }),
            )
            .await;
        Ok(jaf)
    }

    pub async fn list_for_company(&self, company_id: Uuid) -> Result<Vec<Jaf>> {
        let rows = sqlx::query_as::<_, Jaf>(&format!(
            "SELECT {} FROM {} WHERE j.company_id = $1 ORDER BY j.created_at DESC",
            JAF_COLUMNS, JAF_FROM
        ))
        .bind(company_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list(&self, status: Option<JafStatus>) -> Result<Vec<Jaf>> {
        let rows = sqlx::query_as::<_, Jaf>(&format!(
            r#"
            SELECT {} FROM {}
            WHERE ($1::TEXT IS NULL OR j.status = $1)
            ORDER BY j.created_at DESC
            "#,
            JAF_COLUMNS, JAF_FROM
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// One-shot admin decision on a pending announcement.
    pub async fn moderate(
        &self,
        jaf_id: Uuid,
        decision: JafStatus,
        remarks: Option<String>,
        actor: Uuid,
    ) -> Result<Jaf> {
        let mut tx = self.pool.begin().await?;
        let current = load_jaf(&mut *tx, jaf_id, true).await?;
        let next = current.status.moderate(decision)?;
        let rejection_reason = match next {
            JafStatus::Rejected => remarks.clone(),
            _ => None,
        };

        sqlx::query(
            r#"
            UPDATE job_announcements
            SET status = $2, rejection_reason = $3, moderated_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(jaf_id)
        .bind(next.as_str())
        .bind(&rejection_reason)
        .execute(&mut *tx)
        .await?;
        let jaf = load_jaf(&mut *tx, jaf_id, false).await?;
        tx.commit().await?;

        tracing::info!(%jaf_id, status = %next, %actor, "jaf moderated");
        self.notifier
            .notify(mail_templates::jaf_moderated(
                &jaf.company_email,
                &jaf.job_title,
                next,
                remarks.as_deref(),
            ))
            .await;
        self.activity
            .record(
                Some(actor),
                "jaf_moderated",
                json!({ "jaf_id": jaf_id, "from": current.status, "to": next, "remarks": remarks }),
            )
            .await;
        Ok(jaf)
    }

    /// `owner_company` restricts the change to that company's announcements.
    pub async fn set_job_status(
        &self,
        jaf_id: Uuid,
        next: JobStatus,
        owner_company: Option<Uuid>,
        actor: Uuid,
    ) -> Result<Jaf> {
        let mut tx = self.pool.begin().await?;
        let current = load_jaf(&mut *tx, jaf_id, true).await?;
        if let Some(company_id) = owner_company {
            if current.company_id != company_id {
                return Err(Error::Forbidden(ForbiddenReason::NotOwner));
            }
        }
        let next = current.change_job_status(next)?;

        sqlx::query(
            "UPDATE job_announcements SET job_status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(jaf_id)
        .bind(next.as_str())
        .execute(&mut *tx)
        .await?;
        let jaf = load_jaf(&mut *tx, jaf_id, false).await?;
        tx.commit().await?;

        tracing::info!(%jaf_id, from = %current.job_status, to = %next, %actor, "job status changed");
        self.notifier
            .notify(mail_templates::job_status_changed(
                &jaf.company_email,
                &jaf.job_title,
                next,
            ))
            .await;
        self.activity
            .record(
                Some(actor),
                "job_status_changed",
                json!({ "jaf_id": jaf_id, "from": current.job_status, "to": next }),
            )
            .await;
        Ok(jaf)
    }

    /// Approved, open announcements still taking applications, each flagged
    /// with the student's eligibility.
    pub async fn open_jobs_for(&self, student: &Student) -> Result<Vec<StudentJobView>> {
        let rows = sqlx::query_as::<_, Jaf>(&format!(
            r#"
            SELECT {} FROM {}
            WHERE j.status = 'approved' AND j.job_status = 'open' AND j.last_date_to_apply >= NOW()
            ORDER BY j.last_date_to_apply ASC
            "#,
            JAF_COLUMNS, JAF_FROM
        ))
        .fetch_all(&self.pool)
        .await?;

        let applied: Vec<Uuid> =
            sqlx::query_scalar("SELECT jaf_id FROM student_applications WHERE student_id = $1")
                .bind(student.id)
                .fetch_all(&self.pool)
                .await?;

        Ok(job_views(rows, student, &applied))
    }
}

fn job_views(rows: Vec<Jaf>, student: &Student, applied: &[Uuid]) -> Vec<StudentJobView> {
    let candidate = Candidate {
        passing_year: student.passing_year,
        branch: &student.branch,
        degree_type: &student.degree_type,
    };
    let now = Utc::now();
    rows.into_iter()
        .filter(|jaf| jaf.accepting_applications(now).is_ok())
        .map(|jaf| {
            let verdict = jaf.criteria().check(&candidate);
            let applied = applied.contains(&jaf.id);
            StudentJobView {
                jaf: JafResponse::from(jaf),
                eligible: verdict.is_ok(),
                ineligible_reason: verdict.err(),
                applied,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::jaf::IneligibleDimension;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn student(passing_year: i32, branch: &str) -> Student {
        Student {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            email: "a@x.edu".into(),
            full_name: "Asha Rao".into(),
            roll_number: "CSE-21-001".into(),
            phone: "9876543210".into(),
            branch: branch.into(),
            year: 4,
            cgpa: Decimal::new(85, 1),
            passing_year,
            degree_type: "UG".into(),
            is_email_verified: true,
            is_verified_by_admin: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn open_jaf() -> Jaf {
        let now = Utc::now();
        Jaf {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            company_name: "Acme".into(),
            company_email: "hr@acme.io".into(),
            job_title: "SDE".into(),
            job_description: "Build things".into(),
            job_location: "Pune".into(),
            ctc: Decimal::new(1_200_000, 0),
            eligible_batches: vec!["2025".into()],
            eligible_branches: vec!["CSE".into()],
            eligible_degrees: vec!["UG".into()],
            selection_process: "Test, interview".into(),
            total_rounds: 2,
            last_date_to_apply: now + Duration::days(3),
            status: JafStatus::Approved,
            job_status: JobStatus::Open,
            rejection_reason: None,
            moderated_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn job_views_flag_eligibility_per_student() {
        let jaf = open_jaf();
        let views = job_views(vec![jaf.clone()], &student(2025, "CSE"), &[]);
        assert_eq!(views.len(), 1);
        assert!(views[0].eligible);
        assert!(!views[0].applied);

        let views = job_views(vec![jaf], &student(2024, "CSE"), &[]);
        assert!(!views[0].eligible);
        assert_eq!(views[0].ineligible_reason, Some(IneligibleDimension::Batch));
    }

    #[test]
    fn job_views_mark_existing_applications() {
        let jaf = open_jaf();
        let id = jaf.id;
        let views = job_views(vec![jaf], &student(2025, "CSE"), &[id]);
        assert!(views[0].applied);
    }

    #[test]
    fn job_views_drop_announcements_past_deadline() {
        let mut jaf = open_jaf();
        jaf.last_date_to_apply = Utc::now() - Duration::minutes(1);
        assert!(job_views(vec![jaf], &student(2025, "CSE"), &[]).is_empty());
    }
}
