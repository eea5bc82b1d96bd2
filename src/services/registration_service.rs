use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::dto::auth_dto::{
    CompanyRegistration, RegisterRequest, RegisterResponse, StudentRegistration,
    VerifyRegistrationResponse,
};
use crate::error::{Error, Result};
use crate::models::otp::OtpPurpose;
use crate::models::pending_registration::{PendingCompany, PendingRegistration, PendingStudent};
use crate::services::activity_service::ActivityService;
use crate::services::otp_service::OtpService;
use crate::utils::crypto::hash_password;
use crate::utils::validation::normalize_email;

/// OTP-gated account creation: stage the profile on an OTP row, then
/// materialize user and profile together once the code checks out.
#[derive(Clone)]
pub struct RegistrationService {
    pool: PgPool,
    otp: OtpService,
    activity: ActivityService,
}

impl RegistrationService {
    pub fn new(pool: PgPool, otp: OtpService, activity: ActivityService) -> Self {
        Self {
            pool,
            otp,
            activity,
        }
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    pub async fn initiate(&self, request: RegisterRequest) -> Result<RegisterResponse> {
        let email = normalize_email(request.email());
        if self.email_taken(&email).await? {
            return Err(Error::conflict(
                "duplicate_email",
                "An account with this email already exists",
            ));
        }

        let pending = stage(request, &email)?;
        let payload = serde_json::to_value(&pending)?;
        self.otp
            .issue(&email, OtpPurpose::Registration, Some(payload))
            .await?;

        tracing::info!(email = %email, role = %pending.role(), "registration staged");
        Ok(RegisterResponse {
            email,
            message: "A verification code has been sent to your email".to_string(),
        })
    }

    /// Reissues a registration code. The staged profile is carried forward.
    pub async fn resend(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if self.email_taken(&email).await? {
            return Err(Error::conflict(
                "duplicate_email",
                "An account with this email already exists",
            ));
        }
        self.otp.reissue(&email, OtpPurpose::Registration).await?;
        Ok(())
    }

    pub async fn verify(&self, email: &str, code: &str) -> Result<VerifyRegistrationResponse> {
        let email = normalize_email(email);
        let mut tx = self.pool.begin().await?;

        let record = self
            .otp
            .check(&mut *tx, &email, OtpPurpose::Registration, code)
            .await?;
        let payload = record.pending_payload.clone().ok_or_else(|| {
            Error::BadRequest("No registration is pending for this email".to_string())
        })?;
        let pending: PendingRegistration = serde_json::from_value(payload)?;

        // The conditional consume decides a race on the same code; a failed
        // materialize rolls it back.
        self.otp.consume(&mut *tx, record.id).await?;
        let user_id = materialize(&mut *tx, &pending).await?;
        tx.commit().await?;

        tracing::info!(%user_id, role = %pending.role(), "registration completed");
        self.activity
            .record(
                Some(user_id),
                "registration_completed",
                json!({ "role": pending.role(), "email": email }),
            )
            .await;

        Ok(VerifyRegistrationResponse {
            user_id,
            role: pending.role(),
            message: pending.completion_message().to_string(),
        })
    }
}

fn stage(request: RegisterRequest, email: &str) -> Result<PendingRegistration> {
    let pending = match request {
        RegisterRequest::Student(StudentRegistration {
            password,
            full_name,
            roll_number,
            phone,
            branch,
            year,
            cgpa,
            passing_year,
            degree_type,
            ..
        }) => PendingRegistration::Student(PendingStudent {
            email: email.to_string(),
            password_hash: hash_password(&password)?,
            full_name: full_name.trim().to_string(),
            roll_number: roll_number.trim().to_string(),
            phone: phone.trim().to_string(),
            branch: branch.trim().to_string(),
            year,
            cgpa,
            passing_year,
            degree_type: degree_type.trim().to_string(),
        }),
        RegisterRequest::Company(CompanyRegistration {
            password,
            company_name,
            website,
            description,
            contact_person,
            phone,
            ..
        }) => PendingRegistration::Company(PendingCompany {
            email: email.to_string(),
            password_hash: hash_password(&password)?,
            company_name: company_name.trim().to_string(),
            website: website.trim().to_string(),
            description,
            contact_person: contact_person.trim().to_string(),
            phone: phone.trim().to_string(),
        }),
    };
    Ok(pending)
}

/// Inserts the user and its role profile on the caller's transaction.
async fn materialize(conn: &mut PgConnection, pending: &PendingRegistration) -> Result<Uuid> {
    let user_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO users (email, password_hash, role, is_verified, is_active)
        VALUES ($1, $2, $3, TRUE, TRUE)
        RETURNING id
        "#,
    )
    .bind(pending.email())
    .bind(pending.password_hash())
    .bind(pending.role().as_str())
    .fetch_one(&mut *conn)
    .await?;

    match pending {
        PendingRegistration::Student(s) => {
            sqlx::query(
                r#"
                INSERT INTO students (
                    user_id, full_name, roll_number, phone, branch, year, cgpa,
                    passing_year, degree_type, is_email_verified, is_verified_by_admin
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, FALSE)
                "#,
            )
            .bind(user_id)
            .bind(&s.full_name)
            .bind(&s.roll_number)
            .bind(&s.phone)
            .bind(&s.branch)
            .bind(s.year)
            .bind(s.cgpa)
            .bind(s.passing_year)
            .bind(&s.degree_type)
            .execute(&mut *conn)
            .await?;
        }
        PendingRegistration::Company(c) => {
            sqlx::query(
                r#"
                INSERT INTO companies (
                    user_id, company_name, website, description, contact_person, phone,
                    is_email_verified, is_verified_by_admin
                ) VALUES ($1, $2, $3, $4, $5, $6, TRUE, FALSE)
                "#,
            )
            .bind(user_id)
            .bind(&c.company_name)
            .bind(&c.website)
            .bind(&c.description)
            .bind(&c.contact_person)
            .bind(&c.phone)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::crypto::verify_password;
    use rust_decimal::Decimal;

    #[test]
    fn staging_hashes_the_password_and_trims_fields() {
        let request = RegisterRequest::Student(StudentRegistration {
            email: " A@X.edu ".into(),
            password: "Passw0rd!".into(),
            full_name: " Asha Rao ".into(),
            roll_number: "CSE-21-001".into(),
            phone: "9876543210".into(),
            branch: "CSE ".into(),
            year: 4,
            cgpa: Decimal::new(875, 2),
            passing_year: 2025,
            degree_type: "UG".into(),
        });

        let pending = stage(request, "a@x.edu").unwrap();
        assert_eq!(pending.email(), "a@x.edu");
        assert!(verify_password("Passw0rd!", pending.password_hash()).unwrap());
        match pending {
            PendingRegistration::Student(s) => {
                assert_eq!(s.full_name, "Asha Rao");
                assert_eq!(s.branch, "CSE");
            }
            PendingRegistration::Company(_) => panic!("expected student"),
        }
    }

    #[test]
    fn staged_payload_never_carries_the_plain_password() {
        let request = RegisterRequest::Company(CompanyRegistration {
            email: "hr@acme.io".into(),
            password: "Sup3rSecret".into(),
            company_name: "Acme".into(),
            website: "https://acme.io".into(),
            description: "Widgets".into(),
            contact_person: "Wile".into(),
            phone: "9876543210".into(),
        });

        let pending = stage(request, "hr@acme.io").unwrap();
        let value = serde_json::to_string(&pending).unwrap();
        assert!(!value.contains("Sup3rSecret"));
        assert_eq!(pending.role(), crate::models::role::Role::Company);
    }
}
