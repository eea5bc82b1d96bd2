use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationStatus, ApplicationView, RoundStatus};
use crate::utils::validation::validate_not_blank;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyPayload {
    pub jaf_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoundEntry {
    #[validate(range(min = 1, max = 20))]
    pub round_number: i32,
    #[validate(custom(function = "validate_not_blank"))]
    pub round_type: String,
    pub status: RoundStatus,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateApplicationPayload {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
    #[validate(range(min = 1, max = 20))]
    pub current_round: Option<i32>,
    #[validate(nested)]
    pub round: Option<RoundEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub student_id: Uuid,
    pub jaf_id: Uuid,
    pub status: ApplicationStatus,
    pub status_label: String,
    pub current_round: i32,
    pub remarks: Option<String>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationListResponse {
    pub items: Vec<ApplicationView>,
}

impl From<Application> for ApplicationResponse {
    fn from(value: Application) -> Self {
        Self {
            id: value.id,
            student_id: value.student_id,
            jaf_id: value.jaf_id,
            status: value.status,
            status_label: value.status.label().to_string(),
            current_round: value.current_round,
            remarks: value.remarks,
            applied_at: value.applied_at,
            updated_at: value.updated_at,
        }
    }
}
