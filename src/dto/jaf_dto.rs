use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::jaf::{IneligibleDimension, Jaf, JafStatus, JobStatus};
use crate::utils::validation::{validate_non_empty_set, validate_not_blank};

fn validate_ctc(ctc: &Decimal) -> Result<(), ValidationError> {
    if ctc.is_sign_negative() {
        return Err(ValidationError::new("ctc_negative"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateJafPayload {
    #[validate(custom(function = "validate_not_blank"))]
    pub job_title: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub job_description: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub job_location: String,
    #[validate(custom(function = "validate_ctc"))]
    pub ctc: Decimal,
    #[validate(custom(function = "validate_non_empty_set"))]
    pub eligible_batches: Vec<String>,
    #[validate(custom(function = "validate_non_empty_set"))]
    pub eligible_branches: Vec<String>,
    #[validate(custom(function = "validate_non_empty_set"))]
    pub eligible_degrees: Vec<String>,
    #[validate(custom(function = "validate_not_blank"))]
    pub selection_process: String,
    #[validate(range(min = 1, max = 20))]
    pub total_rounds: i32,
    pub last_date_to_apply: DateTime<Utc>,
}

impl CreateJafPayload {
    /// Trimmed and de-duplicated, preserving first-seen order.
    pub fn normalized_set(values: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(values.len());
        for value in values.iter().map(|v| v.trim().to_string()) {
            if !out.contains(&value) {
                out.push(value);
            }
        }
        out
    }
}

/// Moderation decision. `jaf_id` is only read on the body-addressed route.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModerateJafPayload {
    pub jaf_id: Option<Uuid>,
    pub status: JafStatus,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetJobStatusPayload {
    pub jaf_id: Option<Uuid>,
    pub job_status: JobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JafListQuery {
    pub status: Option<JafStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JafResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: String,
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
    pub status: JafStatus,
    pub job_status: JobStatus,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JafListResponse {
    pub items: Vec<JafResponse>,
}

/// An open job as a student sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentJobView {
    #[serde(flatten)]
    pub jaf: JafResponse,
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ineligible_reason: Option<IneligibleDimension>,
    pub applied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentJobListResponse {
    pub items: Vec<StudentJobView>,
}

impl From<Jaf> for JafResponse {
    fn from(value: Jaf) -> Self {
        Self {
            id: value.id,
            company_id: value.company_id,
            company_name: value.company_name,
            job_title: value.job_title,
            job_description: value.job_description,
            job_location: value.job_location,
            ctc: value.ctc,
            eligible_batches: value.eligible_batches,
            eligible_branches: value.eligible_branches,
            eligible_degrees: value.eligible_degrees,
            selection_process: value.selection_process,
            total_rounds: value.total_rounds,
            last_date_to_apply: value.last_date_to_apply,
            status: value.status,
            job_status: value.job_status,
            rejection_reason: value.rejection_reason,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<Vec<Jaf>> for JafListResponse {
    fn from(value: Vec<Jaf>) -> Self {
        Self {
            items: value.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_eligible_set_fails_validation() {
        let payload: CreateJafPayload = serde_json::from_value(json!({
            "job_title": "SDE",
            "job_description": "Build things",
            "job_location": "Pune",
            "ctc": "1200000",
            "eligible_batches": [],
            "eligible_branches": ["CSE"],
            "eligible_degrees": ["UG"],
            "selection_process": "Test, interview",
            "total_rounds": 3,
            "last_date_to_apply": "2030-01-01T00:00:00Z"
        }))
        .unwrap();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("eligible_batches"));
    }

    #[test]
    fn sets_are_trimmed_and_deduplicated() {
        let set = CreateJafPayload::normalized_set(&[
            "CSE".to_string(),
            " ECE ".to_string(),
            "CSE".to_string(),
        ]);
        assert_eq!(set, vec!["CSE".to_string(), "ECE".to_string()]);
    }

    #[test]
    fn moderation_status_parses_snake_case() {
        let payload: ModerateJafPayload =
            serde_json::from_value(json!({ "status": "approved" })).unwrap();
        assert_eq!(payload.status, JafStatus::Approved);
        assert!(payload.jaf_id.is_none());
    }
}
