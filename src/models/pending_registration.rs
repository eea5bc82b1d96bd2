use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::role::Role;

/// Registration data captured before the user row exists. Stored on the OTP
/// record and replayed when the code is verified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PendingRegistration {
    Student(PendingStudent),
    Company(PendingCompany),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingStudent {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub roll_number: String,
    pub phone: String,
    pub branch: String,
    pub year: i32,
    pub cgpa: Decimal,
    pub passing_year: i32,
    pub degree_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingCompany {
    pub email: String,
    pub password_hash: String,
    pub company_name: String,
    pub website: String,
    pub description: String,
    pub contact_person: String,
    pub phone: String,
}

impl PendingRegistration {
    pub fn role(&self) -> Role {
        match self {
            PendingRegistration::Student(_) => Role::Student,
            PendingRegistration::Company(_) => Role::Company,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            PendingRegistration::Student(s) => &s.email,
            PendingRegistration::Company(c) => &c.email,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            PendingRegistration::Student(s) => &s.password_hash,
            PendingRegistration::Company(c) => &c.password_hash,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            PendingRegistration::Student(s) => &s.full_name,
            PendingRegistration::Company(c) => &c.company_name,
        }
    }

    /// Message shown once the account has been materialized.
    pub fn completion_message(&self) -> &'static str {
        match self {
            PendingRegistration::Student(_) => {
                "Registration successful. Please login once your account has been verified."
            }
            PendingRegistration::Company(_) => {
                "Registration successful. Your account is pending admin verification."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_is_tagged_by_type() {
        let pending = PendingRegistration::Company(PendingCompany {
            email: "hr@acme.test".into(),
            password_hash: "$argon2id$stub".into(),
            company_name: "Acme".into(),
            website: "https://acme.test".into(),
            description: "Widgets".into(),
            contact_person: "Wile".into(),
            phone: "9876543210".into(),
        });
        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["type"], json!("company"));
        assert_eq!(value["company_name"], json!("Acme"));

        let back: PendingRegistration = serde_json::from_value(value).unwrap();
        assert_eq!(back.role(), Role::Company);
        assert_eq!(back.email(), "hr@acme.test");
    }

    #[test]
    fn student_payload_resolves_student_role() {
        let value = json!({
            "type": "student",
            "email": "a@x.edu",
            "password_hash": "$argon2id$stub",
            "full_name": "Asha",
            "roll_number": "CSE-21-001",
            "phone": "9876543210",
            "branch": "CSE",
            "year": 4,
            "cgpa": "8.75",
            "passing_year": 2025,
            "degree_type": "UG"
        });
        let pending: PendingRegistration = serde_json::from_value(value).unwrap();
        assert_eq!(pending.role(), Role::Student);
        assert_eq!(pending.display_name(), "Asha");
    }
}
