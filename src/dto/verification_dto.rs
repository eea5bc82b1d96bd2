use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::company::Company;
use crate::models::student::Student;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyAction {
    Verify,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyStudentRequest {
    pub student_id: Uuid,
    pub action: VerifyAction,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyCompanyRequest {
    pub company_id: Uuid,
    pub action: VerifyAction,
    #[validate(length(max = 1000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionResponse {
    pub id: Uuid,
    pub action: VerifyAction,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingStudentSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roll_number: String,
    pub branch: String,
    pub year: i32,
    pub cgpa: Decimal,
    pub passing_year: i32,
    pub degree_type: String,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCompanySummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub company_name: String,
    pub website: String,
    pub contact_person: String,
    pub phone: String,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl From<Student> for PendingStudentSummary {
    fn from(value: Student) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            email: value.email,
            full_name: value.full_name,
            roll_number: value.roll_number,
            branch: value.branch,
            year: value.year,
            cgpa: value.cgpa,
            passing_year: value.passing_year,
            degree_type: value.degree_type,
            registered_at: value.created_at,
        }
    }
}

impl From<Company> for PendingCompanySummary {
    fn from(value: Company) -> Self {
        Self {
            id: value.id,
            user_id: value.user_id,
            email: value.email,
            company_name: value.company_name,
            website: value.website,
            contact_person: value.contact_person,
            phone: value.phone,
            rejected_at: value.rejected_at,
            rejection_reason: value.rejection_reason,
            registered_at: value.created_at,
        }
    }
}
