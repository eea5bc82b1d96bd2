use super::application::ApplicationStatus;
use super::jaf::{JafStatus, JobStatus};

/// A workflow step that the current state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("job announcement has already been moderated ({0})")]
    AlreadyModerated(JafStatus),
    #[error("moderation decision must be approved or rejected")]
    InvalidModeration,
    #[error("job announcement is not approved")]
    NotApproved,
    #[error("job status cannot change from {from} to {to}")]
    JobStatus { from: JobStatus, to: JobStatus },
    #[error("job announcement is not open for applications")]
    NotOpen,
    #[error("the last date to apply has passed")]
    DeadlinePassed,
    #[error("application is already {0} and can no longer change")]
    Terminal(ApplicationStatus),
    #[error("application cannot move back from {from} to {to}")]
    Regression {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
    #[error("current round cannot decrease from {current} to {requested}")]
    RoundRegression { current: i32, requested: i32 },
    #[error("profile is already verified")]
    AlreadyVerified,
}

impl TransitionError {
    pub fn code(&self) -> &'static str {
        match self {
            TransitionError::AlreadyModerated(_) => "jaf_already_moderated",
            TransitionError::InvalidModeration => "invalid_moderation_status",
            TransitionError::NotApproved => "jaf_not_approved",
            TransitionError::JobStatus { .. } => "invalid_job_status_transition",
            TransitionError::NotOpen => "jaf_not_open",
            TransitionError::DeadlinePassed => "application_deadline_passed",
            TransitionError::Terminal(_) => "application_terminal",
            TransitionError::Regression { .. } => "application_status_regression",
            TransitionError::RoundRegression { .. } => "application_round_regression",
            TransitionError::AlreadyVerified => "already_verified",
        }
    }
}
