use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::jaf::IneligibleDimension;
use crate::models::otp::OtpRejection;
use crate::models::transition::TransitionError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ForbiddenReason {
    #[error("your role is not allowed to perform this action")]
    Role,
    #[error("account is inactive")]
    AccountInactive,
    #[error("account is pending admin verification")]
    PendingVerification,
    #[error("resource belongs to another account")]
    NotOwner,
}

impl ForbiddenReason {
    pub fn code(&self) -> &'static str {
        match self {
            ForbiddenReason::Role => "forbidden",
            ForbiddenReason::AccountInactive => "account_inactive",
            ForbiddenReason::PendingVerification => "pending_verification",
            ForbiddenReason::NotOwner => "not_owner",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(ForbiddenReason),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {message}")]
    Conflict {
        reason: &'static str,
        message: String,
    },

    #[error("{0}")]
    Otp(#[from] OtpRejection),

    #[error("{0}")]
    Ineligible(#[from] IneligibleDimension),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("Email delivery failed: {0}")]
    Delivery(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn conflict(reason: &'static str, message: impl Into<String>) -> Self {
        Error::Conflict {
            reason,
            message: message.into(),
        }
    }

    /// Machine-readable reason carried in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::BadRequest(_) | Error::Json(_) => "bad_request",
            Error::Unauthorized(_) | Error::Token(_) => "unauthorized",
            Error::InvalidCredentials => "invalid_credentials",
            Error::Forbidden(reason) => reason.code(),
            Error::NotFound(_) => "not_found",
            Error::Conflict { reason, .. } => *reason,
            Error::Otp(rejection) => rejection.code(),
            Error::Ineligible(dimension) => dimension.code(),
            Error::Transition(err) => err.code(),
            Error::Delivery(_) => "delivery_failed",
            Error::Validation(_) => "validation_error",
            Error::Database(_)
            | Error::Migrate(_)
            | Error::Anyhow(_)
            | Error::Internal(_)
            | Error::Io(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_)
            | Error::Json(_)
            | Error::Validation(_)
            | Error::Conflict { .. }
            | Error::Ineligible(_)
            | Error::Transition(_) => StatusCode::BAD_REQUEST,
            Error::Otp(OtpRejection::NotFound) => StatusCode::NOT_FOUND,
            Error::Otp(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) | Error::Token(_) | Error::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Delivery(_) => StatusCode::BAD_GATEWAY,
            Error::Config(_)
            | Error::Database(_)
            | Error::Migrate(_)
            | Error::Anyhow(_)
            | Error::Internal(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();

        let body = match &self {
            Error::Validation(errors) => {
                let mut fields: Vec<String> =
                    errors.field_errors().keys().map(|k| k.to_string()).collect();
                fields.sort_unstable();
                json!({ "error": self.to_string(), "code": code, "fields": fields })
            }
            _ if status.is_server_error() && status != StatusCode::BAD_GATEWAY => {
                tracing::error!(error = %self, "request failed");
                json!({ "error": "An unexpected error occurred", "code": code })
            }
            _ => json!({ "error": self.to_string(), "code": code }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                match db.constraint() {
                    Some("users_email_key") => {
                        Error::conflict("duplicate_email", "An account with this email already exists")
                    }
                    Some("students_roll_number_key") => Error::conflict(
                        "duplicate_roll_number",
                        "A student with this roll number is already registered",
                    ),
                    Some("application_rounds_application_id_round_number_key") => Error::conflict(
                        "duplicate_round",
                        "This round has already been recorded",
                    ),
                    Some("student_applications_student_id_jaf_id_key") => Error::conflict(
                        "duplicate_application",
                        "You have already applied to this job",
                    ),
                    _ => Error::conflict("duplicate", "Resource already exists"),
                }
            }
            other => Error::Database(other),
        }
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Error::Internal(format!("password hashing failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_rejections_map_to_distinct_codes() {
        assert_eq!(Error::from(OtpRejection::Mismatch).code(), "otp_mismatch");
        assert_eq!(Error::from(OtpRejection::Expired).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::from(OtpRejection::NotFound).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn ineligibility_names_the_dimension() {
        let err = Error::from(IneligibleDimension::Batch);
        assert_eq!(err.code(), "ineligible_batch");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn conflicts_are_bad_requests() {
        let err = Error::conflict("duplicate_application", "again");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "duplicate_application");
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = Error::from(sqlx::Error::RowNotFound);
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn pending_verification_is_forbidden() {
        let err = Error::Forbidden(ForbiddenReason::PendingVerification);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.code(), "pending_verification");
    }
}
