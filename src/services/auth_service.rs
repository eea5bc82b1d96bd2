use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::auth_dto::{LoginRequest, LoginResponse};
use crate::error::{Error, ForbiddenReason, Result};
use crate::models::otp::OtpPurpose;
use crate::models::role::Role;
use crate::models::user::{LoginRefusal, User};
use crate::services::activity_service::ActivityService;
use crate::services::otp_service::OtpService;
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::issue_token;
use crate::utils::validation::normalize_email;

const USER_COLUMNS: &str =
    "id, email, password_hash, role, is_verified, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    otp: OtpService,
    activity: ActivityService,
    jwt_secret: String,
    jwt_ttl_hours: i64,
}

impl AuthService {
    pub fn new(
        pool: PgPool,
        otp: OtpService,
        activity: ActivityService,
        jwt_secret: String,
        jwt_ttl_hours: i64,
    ) -> Self {
        Self {
            pool,
            otp,
            activity,
            jwt_secret,
            jwt_ttl_hours,
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    /// Admin verification flag of the user's role profile, if the role has one.
    async fn admin_verified(&self, user: &User) -> Result<Option<bool>> {
        let table = match user.role {
            Role::Student => "students",
            Role::Company => "companies",
            Role::Admin | Role::SuperAdmin => return Ok(None),
        };
        let flag = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT is_verified_by_admin FROM {} WHERE user_id = $1",
            table
        ))
        .bind(user.id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(flag)
    }

    /// Refuses inactive accounts and profiles an admin has not verified, or
    /// has since rejected.
    pub async fn ensure_admitted(&self, user: &User) -> Result<()> {
        let admin_verified = self.admin_verified(user).await?;
        match user.login_refusal(admin_verified) {
            Some(LoginRefusal::Inactive) => Err(Error::Forbidden(ForbiddenReason::AccountInactive)),
            Some(LoginRefusal::PendingVerification) => {
                Err(Error::Forbidden(ForbiddenReason::PendingVerification))
            }
            None => Ok(()),
        }
    }

    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse> {
        let email = normalize_email(&request.email);
        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(Error::InvalidCredentials)?;
        if !verify_password(&request.password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "login refused: bad password");
            return Err(Error::InvalidCredentials);
        }

        self.ensure_admitted(&user).await?;

        let token = issue_token(&self.jwt_secret, user.id, user.role, self.jwt_ttl_hours)?;
        tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok(LoginResponse {
            token,
            user_id: user.id,
            role: user.role,
        })
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_none() {
            return Err(Error::NotFound("No account exists for this email".to_string()));
        }
        self.otp.issue(&email, OtpPurpose::PasswordReset, None).await?;
        Ok(())
    }

    pub async fn resend_reset_code(&self, email: &str) -> Result<()> {
        let email = normalize_email(email);
        if self.find_by_email(&email).await?.is_none() {
            return Err(Error::NotFound("No account exists for this email".to_string()));
        }
        self.otp.reissue(&email, OtpPurpose::PasswordReset).await?;
        Ok(())
    }

    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        let email = normalize_email(email);
        let password_hash = hash_password(new_password)?;

        let mut tx = self.pool.begin().await?;
        let record = self
            .otp
            .check(&mut *tx, &email, OtpPurpose::PasswordReset, code)
            .await?;
        self.otp.consume(&mut *tx, record.id).await?;

        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE users SET password_hash = $2, updated_at = NOW()
            WHERE email = $1
            RETURNING id
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .fetch_optional(&mut *tx)
        .await?;
        let user_id =
            user_id.ok_or_else(|| Error::NotFound("No account exists for this email".to_string()))?;
        tx.commit().await?;

        tracing::info!(%user_id, "password reset");
        self.activity
            .record(Some(user_id), "password_reset", json!({ "email": email }))
            .await;
        Ok(())
    }
}
