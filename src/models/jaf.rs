use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::role::ParseEnumError;
use super::transition::TransitionError;

/// Admin moderation status of a job announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JafStatus {
    Pending,
    Approved,
    Rejected,
}

impl JafStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JafStatus::Pending => "pending",
            JafStatus::Approved => "approved",
            JafStatus::Rejected => "rejected",
        }
    }

    /// Moderation is a one-shot decision out of `Pending`.
    pub fn moderate(self, decision: JafStatus) -> Result<JafStatus, TransitionError> {
        if decision == JafStatus::Pending {
            return Err(TransitionError::InvalidModeration);
        }
        match self {
            JafStatus::Pending => Ok(decision),
            done => Err(TransitionError::AlreadyModerated(done)),
        }
    }
}

impl fmt::Display for JafStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JafStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JafStatus::Pending),
            "approved" => Ok(JafStatus::Approved),
            "rejected" => Ok(JafStatus::Rejected),
            other => Err(ParseEnumError::new("jaf status", other)),
        }
    }
}

impl TryFrom<String> for JafStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Hiring lifecycle of an announcement, independent of moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    Closed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_become(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Open, Closed) | (Open, Cancelled) | (Closed, Open) | (Closed, Cancelled)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            "cancelled" => Ok(JobStatus::Cancelled),
            other => Err(ParseEnumError::new("job status", other)),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Jaf {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
    #[serde(skip_serializing)]
    pub company_email: String,
    pub job_title: String,
    pub job_description: String,
    pub job_location: String,
    pub ctc: Decimal,
    pub eligible_batches: Vec<String>,
    pub eligible_branches: Vec<String>,
    pub eligible_degrees: Vec<String>,
    pub selection_process: String,
    pub total_rounds: i32,
    pub last_date_to_apply: DateTime<Utc>,
    #[sqlx(try_from = "String")]
    pub status: JafStatus,
    #[sqlx(try_from = "String")]
    pub job_status: JobStatus,
    pub rejection_reason: Option<String>,
    pub moderated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Jaf {
    pub fn change_job_status(&self, next: JobStatus) -> Result<JobStatus, TransitionError> {
        if self.status != JafStatus::Approved {
            return Err(TransitionError::NotApproved);
        }
        if !self.job_status.can_become(next) {
            return Err(TransitionError::JobStatus {
                from: self.job_status,
                to: next,
            });
        }
        Ok(next)
    }

    /// Deadline is inclusive.
    pub fn accepting_applications(&self, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.status != JafStatus::Approved {
            return Err(TransitionError::NotApproved);
        }
        if self.job_status != JobStatus::Open {
            return Err(TransitionError::NotOpen);
        }
        if now > self.last_date_to_apply {
            return Err(TransitionError::DeadlinePassed);
        }
        Ok(())
    }

    pub fn criteria(&self) -> EligibilityCriteria {
        EligibilityCriteria::new(
            self.eligible_batches.iter().cloned(),
            self.eligible_branches.iter().cloned(),
            self.eligible_degrees.iter().cloned(),
        )
    }
}

/// Dimension of the eligible sets that a student falls outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum IneligibleDimension {
    #[error("student's batch is not eligible for this job")]
    Batch,
    #[error("student's branch is not eligible for this job")]
    Branch,
    #[error("student's degree is not eligible for this job")]
    Degree,
}

impl IneligibleDimension {
    pub fn code(&self) -> &'static str {
        match self {
            IneligibleDimension::Batch => "ineligible_batch",
            IneligibleDimension::Branch => "ineligible_branch",
            IneligibleDimension::Degree => "ineligible_degree",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EligibilityCriteria {
    batches: BTreeSet<String>,
    branches: BTreeSet<String>,
    degrees: BTreeSet<String>,
}

/// The attributes of a student that eligibility is matched on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub passing_year: i32,
    pub branch: &'a str,
    pub degree_type: &'a str,
}

impl EligibilityCriteria {
    pub fn new(
        batches: impl IntoIterator<Item = String>,
        branches: impl IntoIterator<Item = String>,
        degrees: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            batches: batches.into_iter().collect(),
            branches: branches.into_iter().collect(),
            degrees: degrees.into_iter().collect(),
        }
    }

    /// Exact set membership per dimension, checked batch, branch, degree.
    pub fn check(&self, candidate: &Candidate<'_>) -> Result<(), IneligibleDimension> {
        if !self.batches.contains(&candidate.passing_year.to_string()) {
            return Err(IneligibleDimension::Batch);
        }
        if !self.branches.contains(candidate.branch) {
            return Err(IneligibleDimension::Branch);
        }
        if !self.degrees.contains(candidate.degree_type) {
            return Err(IneligibleDimension::Degree);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn jaf(status: JafStatus, job_status: JobStatus) -> Jaf {
        let now = Utc::now();
        Jaf {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            company_name: "Acme".into(),
            company_email: "hr@acme.test".into(),
            job_title: "SDE".into(),
            job_description: "Build things".into(),
            job_location: "Pune".into(),
            ctc: Decimal::new(1_200_000, 0),
            eligible_batches: vec!["2025".into()],
            eligible_branches: vec!["CSE".into()],
            eligible_degrees: vec!["UG".into()],
            selection_process: "Test, interview".into(),
            total_rounds: 3,
            last_date_to_apply: now + Duration::days(7),
            status,
            job_status,
            rejection_reason: None,
            moderated_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn moderation_is_one_shot() {
        assert_eq!(
            JafStatus::Pending.moderate(JafStatus::Approved),
            Ok(JafStatus::Approved)
        );
        assert_eq!(
            JafStatus::Approved.moderate(JafStatus::Rejected),
            Err(TransitionError::AlreadyModerated(JafStatus::Approved))
        );
        assert_eq!(
            JafStatus::Rejected.moderate(JafStatus::Approved),
            Err(TransitionError::AlreadyModerated(JafStatus::Rejected))
        );
        assert_eq!(
            JafStatus::Pending.moderate(JafStatus::Pending),
            Err(TransitionError::InvalidModeration)
        );
    }

    #[test]
    fn job_status_requires_approval() {
        let pending = jaf(JafStatus::Pending, JobStatus::Open);
        assert_eq!(
            pending.change_job_status(JobStatus::Closed),
            Err(TransitionError::NotApproved)
        );
        let approved = jaf(JafStatus::Approved, JobStatus::Open);
        assert_eq!(approved.change_job_status(JobStatus::Closed), Ok(JobStatus::Closed));
    }

    #[test]
    fn cancelled_is_terminal() {
        let cancelled = jaf(JafStatus::Approved, JobStatus::Cancelled);
        assert!(cancelled.change_job_status(JobStatus::Open).is_err());
        assert!(JobStatus::Closed.can_become(JobStatus::Open));
        assert!(!JobStatus::Open.can_become(JobStatus::Open));
    }

    #[test]
    fn applications_need_approved_open_and_before_deadline() {
        let now = Utc::now();
        assert_eq!(
            jaf(JafStatus::Pending, JobStatus::Open).accepting_applications(now),
            Err(TransitionError::NotApproved)
        );
        assert_eq!(
            jaf(JafStatus::Approved, JobStatus::Closed).accepting_applications(now),
            Err(TransitionError::NotOpen)
        );
        let open = jaf(JafStatus::Approved, JobStatus::Open);
        assert_eq!(open.accepting_applications(now), Ok(()));
        assert_eq!(open.accepting_applications(open.last_date_to_apply), Ok(()));
        assert_eq!(
            open.accepting_applications(open.last_date_to_apply + Duration::seconds(1)),
            Err(TransitionError::DeadlinePassed)
        );
    }

    #[test]
    fn eligible_student_passes_all_dimensions() {
        let criteria = jaf(JafStatus::Approved, JobStatus::Open).criteria();
        let student = Candidate {
            passing_year: 2025,
            branch: "CSE",
            degree_type: "UG",
        };
        assert_eq!(criteria.check(&student), Ok(()));
    }

    #[test]
    fn wrong_batch_is_reported_as_batch() {
        let criteria = jaf(JafStatus::Approved, JobStatus::Open).criteria();
        let student = Candidate {
            passing_year: 2024,
            branch: "CSE",
            degree_type: "UG",
        };
        assert_eq!(criteria.check(&student), Err(IneligibleDimension::Batch));
    }

    #[test]
    fn branch_and_degree_are_checked_in_order() {
        let criteria = EligibilityCriteria::new(
            ["2025".to_string()],
            ["CSE".to_string(), "ECE".to_string()],
            ["PG".to_string()],
        );
        let wrong_branch = Candidate {
            passing_year: 2025,
            branch: "ME",
            degree_type: "UG",
        };
        assert_eq!(criteria.check(&wrong_branch), Err(IneligibleDimension::Branch));
        let wrong_degree = Candidate {
            passing_year: 2025,
            branch: "ECE",
            degree_type: "UG",
        };
        assert_eq!(criteria.check(&wrong_degree), Err(IneligibleDimension::Degree));
    }

    #[test]
    fn membership_is_case_sensitive() {
        let criteria = EligibilityCriteria::new(
            ["2025".to_string()],
            ["CSE".to_string()],
            ["UG".to_string()],
        );
        let student = Candidate {
            passing_year: 2025,
            branch: "cse",
            degree_type: "UG",
        };
        assert_eq!(criteria.check(&student), Err(IneligibleDimension::Branch));
    }
}
