use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::role::ParseEnumError;
use super::transition::TransitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Shortlisted,
    ResumeShortlisted,
    WrittenTest,
    GdRound,
    TechnicalInterview,
    HrInterview,
    OfferGiven,
    Selected,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 10] = [
        ApplicationStatus::Applied,
        ApplicationStatus::Shortlisted,
        ApplicationStatus::ResumeShortlisted,
        ApplicationStatus::WrittenTest,
        ApplicationStatus::GdRound,
        ApplicationStatus::TechnicalInterview,
        ApplicationStatus::HrInterview,
        ApplicationStatus::OfferGiven,
        ApplicationStatus::Selected,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::ResumeShortlisted => "resume_shortlisted",
            ApplicationStatus::WrittenTest => "written_test",
            ApplicationStatus::GdRound => "gd_round",
            ApplicationStatus::TechnicalInterview => "technical_interview",
            ApplicationStatus::HrInterview => "hr_interview",
            ApplicationStatus::OfferGiven => "offer_given",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Shortlisted => "Shortlisted",
            ApplicationStatus::ResumeShortlisted => "Resume Shortlisted",
            ApplicationStatus::WrittenTest => "Written Test",
            ApplicationStatus::GdRound => "GD Round",
            ApplicationStatus::TechnicalInterview => "Technical Interview",
            ApplicationStatus::HrInterview => "HR Interview",
            ApplicationStatus::OfferGiven => "Offer Given",
            ApplicationStatus::Selected => "Selected",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Selected | ApplicationStatus::Rejected)
    }

    /// Position in the progression. Both shortlist flavours share a rank.
    /// `Rejected` has no rank: it is reachable from anywhere.
    fn rank(&self) -> Option<u8> {
        match self {
            ApplicationStatus::Applied => Some(0),
            ApplicationStatus::Shortlisted | ApplicationStatus::ResumeShortlisted => Some(1),
            ApplicationStatus::WrittenTest => Some(2),
            ApplicationStatus::GdRound => Some(3),
            ApplicationStatus::TechnicalInterview => Some(4),
            ApplicationStatus::HrInterview => Some(5),
            ApplicationStatus::OfferGiven => Some(6),
            ApplicationStatus::Selected => Some(7),
            ApplicationStatus::Rejected => None,
        }
    }

    pub fn advance_to(self, next: ApplicationStatus) -> Result<ApplicationStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal(self));
        }
        match (self.rank(), next.rank()) {
            (_, None) => Ok(next),
            (Some(from), Some(to)) if to >= from => Ok(next),
            _ => Err(TransitionError::Regression {
                from: self,
                to: next,
            }),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ParseEnumError::new("application status", s))
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Cleared,
    Pending,
    Failed,
}

impl RoundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundStatus::Cleared => "cleared",
            RoundStatus::Pending => "pending",
            RoundStatus::Failed => "failed",
        }
    }
}

impl FromStr for RoundStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cleared" => Ok(RoundStatus::Cleared),
            "pending" => Ok(RoundStatus::Pending),
            "failed" => Ok(RoundStatus::Failed),
            other => Err(ParseEnumError::new("round status", other)),
        }
    }
}

impl TryFrom<String> for RoundStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub jaf_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub current_round: i32,
    pub remarks: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Validates a status/round update against the current state and returns
    /// the round the application ends up on.
    pub fn plan_update(
        &self,
        next: ApplicationStatus,
        requested_round: Option<i32>,
    ) -> Result<i32, TransitionError> {
        self.status.advance_to(next)?;
        match requested_round {
            Some(round) if round < self.current_round => Err(TransitionError::RoundRegression {
                current: self.current_round,
                requested: round,
            }),
            Some(round) => Ok(round),
            None => Ok(self.current_round),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRound {
    pub id: Uuid,
    pub application_id: Uuid,
    pub round_number: i32,
    pub round_type: String,
    #[sqlx(try_from = "String")]
    pub status: RoundStatus,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Application joined with the people and job it concerns. `rounds_cleared`
/// is derived from the round ledger.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationView {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub student_email: String,
    pub roll_number: String,
    pub branch: String,
    pub jaf_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub current_round: i32,
    pub remarks: Option<String>,
    pub rounds_cleared: i64,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
