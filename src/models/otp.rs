use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::role::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    PasswordReset,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Registration => "registration",
            OtpPurpose::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpPurpose {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registration" => Ok(OtpPurpose::Registration),
            "password_reset" => Ok(OtpPurpose::PasswordReset),
            other => Err(ParseEnumError::new("otp purpose", other)),
        }
    }
}

impl TryFrom<String> for OtpPurpose {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Why a presented code was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpRejection {
    #[error("no verification code was issued for this email")]
    NotFound,
    #[error("verification code has already been used")]
    AlreadyUsed,
    #[error("verification code does not match")]
    Mismatch,
    #[error("verification code has expired")]
    Expired,
}

impl OtpRejection {
    pub fn code(&self) -> &'static str {
        match self {
            OtpRejection::NotFound => "otp_not_found",
            OtpRejection::AlreadyUsed => "otp_already_used",
            OtpRejection::Mismatch => "otp_mismatch",
            OtpRejection::Expired => "otp_expired",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OtpRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub code_hash: String,
    #[sqlx(try_from = "String")]
    pub purpose: OtpPurpose,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    #[serde(skip_serializing)]
    pub pending_payload: Option<JsonValue>,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    /// Checks run in a fixed order: used, then code, then expiry.
    pub fn check(&self, presented_hash: &str, now: DateTime<Utc>) -> Result<(), OtpRejection> {
        if self.used {
            return Err(OtpRejection::AlreadyUsed);
        }
        if !crate::utils::otp::hashes_match(&self.code_hash, presented_hash) {
            return Err(OtpRejection::Mismatch);
        }
        if now > self.expires_at {
            return Err(OtpRejection::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::otp::hash_code;
    use chrono::Duration;

    fn record(code: &str, issued: DateTime<Utc>, used: bool) -> OtpRecord {
        OtpRecord {
            id: Uuid::new_v4(),
            email: "a@x.edu".into(),
            code_hash: hash_code("secret", "a@x.edu", OtpPurpose::Registration, code).unwrap(),
            purpose: OtpPurpose::Registration,
            expires_at: issued + Duration::minutes(10),
            used,
            pending_payload: None,
            created_at: issued,
        }
    }

    fn presented(code: &str) -> String {
        hash_code("secret", "a@x.edu", OtpPurpose::Registration, code).unwrap()
    }

    #[test]
    fn correct_code_within_window_is_accepted() {
        let issued = Utc::now();
        let otp = record("123456", issued, false);
        assert_eq!(otp.check(&presented("123456"), issued + Duration::minutes(9)), Ok(()));
    }

    #[test]
    fn wrong_code_is_a_mismatch() {
        let issued = Utc::now();
        let otp = record("123456", issued, false);
        assert_eq!(
            otp.check(&presented("000000"), issued),
            Err(OtpRejection::Mismatch)
        );
    }

    #[test]
    fn correct_code_after_window_is_expired() {
        let issued = Utc::now();
        let otp = record("123456", issued, false);
        assert_eq!(
            otp.check(&presented("123456"), issued + Duration::minutes(11)),
            Err(OtpRejection::Expired)
        );
    }

    #[test]
    fn used_code_is_rejected_before_anything_else() {
        let issued = Utc::now();
        let otp = record("123456", issued, true);
        assert_eq!(
            otp.check(&presented("000000"), issued + Duration::hours(1)),
            Err(OtpRejection::AlreadyUsed)
        );
    }

    #[test]
    fn purpose_parses_column_values() {
        assert_eq!("password_reset".parse::<OtpPurpose>().unwrap(), OtpPurpose::PasswordReset);
        assert!("login".parse::<OtpPurpose>().is_err());
    }
}
