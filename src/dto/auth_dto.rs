use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::otp::OtpPurpose;
use crate::models::role::Role;
use crate::utils::validation::{validate_not_blank, validate_otp_code, validate_phone};

fn default_degree_type() -> String {
    "UG".to_string()
}

fn validate_cgpa(cgpa: &Decimal) -> Result<(), ValidationError> {
    if *cgpa < Decimal::ZERO || *cgpa > Decimal::TEN {
        return Err(ValidationError::new("cgpa_range"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StudentRegistration {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub full_name: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub roll_number: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub branch: String,
    #[validate(range(min = 1, max = 6))]
    pub year: i32,
    #[validate(custom(function = "validate_cgpa"))]
    pub cgpa: Decimal,
    #[validate(range(min = 2000, max = 2100))]
    pub passing_year: i32,
    #[serde(default = "default_degree_type")]
    #[validate(custom(function = "validate_not_blank"))]
    pub degree_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CompanyRegistration {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub company_name: String,
    #[validate(url)]
    pub website: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub description: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub contact_person: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

/// Registration submission, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegisterRequest {
    Student(StudentRegistration),
    Company(CompanyRegistration),
}

impl RegisterRequest {
    pub fn email(&self) -> &str {
        match self {
            RegisterRequest::Student(s) => &s.email,
            RegisterRequest::Company(c) => &c.email,
        }
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            RegisterRequest::Student(s) => s.validate(),
            RegisterRequest::Company(c) => c.validate(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VerifyRegistrationRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_otp_code"))]
    pub otp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRegistrationResponse {
    pub user_id: Uuid,
    pub role: Role,
    pub message: String,
}

fn default_purpose() -> OtpPurpose {
    OtpPurpose::Registration
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResendOtpRequest {
    #[validate(email)]
    pub email: String,
    #[serde(default = "default_purpose")]
    pub purpose: OtpPurpose,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_otp_code"))]
    pub otp: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn student_json() -> serde_json::Value {
        json!({
            "type": "student",
            "email": "a@x.edu",
            "password": "Passw0rd!",
            "full_name": "Asha Rao",
            "roll_number": "CSE-21-001",
            "phone": "9876543210",
            "branch": "CSE",
            "year": 4,
            "cgpa": 8.5,
            "passing_year": 2025
        })
    }

    #[test]
    fn valid_student_registration_passes() {
        let req: RegisterRequest = serde_json::from_value(student_json()).unwrap();
        assert!(req.validate().is_ok());
        match req {
            RegisterRequest::Student(s) => assert_eq!(s.degree_type, "UG"),
            RegisterRequest::Company(_) => panic!("expected student"),
        }
    }

    #[test]
    fn invalid_student_fields_are_listed() {
        let mut body = student_json();
        body["password"] = json!("short");
        body["phone"] = json!("12345");
        body["cgpa"] = json!(11);
        let req: RegisterRequest = serde_json::from_value(body).unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("password"));
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("cgpa"));
        assert!(!fields.contains_key("email"));
    }

    #[test]
    fn company_needs_a_real_website() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "type": "company",
            "email": "hr@acme.test",
            "password": "Passw0rd!",
            "company_name": "Acme",
            "website": "not a url",
            "description": "Widgets",
            "contact_person": "Wile",
            "phone": "9876543210"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("website"));
    }

    #[test]
    fn unknown_type_tag_is_rejected() {
        let mut body = student_json();
        body["type"] = json!("admin");
        assert!(serde_json::from_value::<RegisterRequest>(body).is_err());
    }

    #[test]
    fn resend_defaults_to_registration() {
        let req: ResendOtpRequest = serde_json::from_value(json!({ "email": "a@x.edu" })).unwrap();
        assert_eq!(req.purpose, OtpPurpose::Registration);
    }
}
