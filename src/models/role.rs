use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Closed set of account roles. Parsed once at the session boundary; nothing
/// downstream compares role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    Admin,
    Student,
    Company,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::Admin => "admin",
            Role::Student => "student",
            Role::Company => "company",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }

    /// Roles whose login is gated on admin verification of their profile.
    pub fn requires_admin_verification(&self) -> bool {
        matches!(self, Role::Student | Role::Company)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Role::SuperAdmin),
            "admin" => Ok(Role::Admin),
            "student" => Ok(Role::Student),
            "company" => Ok(Role::Company),
            other => Err(ParseEnumError::new("role", other)),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_column_value() {
        for role in [Role::SuperAdmin, Role::Admin, Role::Student, Role::Company] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn role_parsing_is_exact() {
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("SuperAdmin".parse::<Role>().is_err());
    }

    #[test]
    fn only_students_and_companies_need_admin_verification() {
        assert!(Role::Student.requires_admin_verification());
        assert!(Role::Company.requires_admin_verification());
        assert!(!Role::Admin.requires_admin_verification());
        assert!(!Role::SuperAdmin.requires_admin_verification());
    }

    #[test]
    fn role_serializes_as_snake_case() {
        let json = serde_json::to_string(&Role::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
    }
}
