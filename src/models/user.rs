use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Why a login attempt was refused after the password checked out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginRefusal {
    Inactive,
    PendingVerification,
}

impl User {
    /// `admin_verified` is the role profile's flag; `None` for roles that have
    /// no profile row.
    pub fn login_refusal(&self, admin_verified: Option<bool>) -> Option<LoginRefusal> {
        if !self.is_active {
            return Some(LoginRefusal::Inactive);
        }
        if self.role.requires_admin_verification() && !admin_verified.unwrap_or(false) {
            return Some(LoginRefusal::PendingVerification);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role, is_active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.edu".into(),
            password_hash: String::new(),
            role,
            is_verified: true,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unverified_student_is_refused() {
        let u = user(Role::Student, true);
        assert_eq!(
            u.login_refusal(Some(false)),
            Some(LoginRefusal::PendingVerification)
        );
        assert_eq!(u.login_refusal(None), Some(LoginRefusal::PendingVerification));
        assert_eq!(u.login_refusal(Some(true)), None);
    }

    #[test]
    fn unverified_company_is_refused() {
        let u = user(Role::Company, true);
        assert_eq!(
            u.login_refusal(Some(false)),
            Some(LoginRefusal::PendingVerification)
        );
    }

    #[test]
    fn inactive_accounts_are_refused_first() {
        let u = user(Role::Student, false);
        assert_eq!(u.login_refusal(Some(true)), Some(LoginRefusal::Inactive));
        let admin = user(Role::Admin, false);
        assert_eq!(admin.login_refusal(None), Some(LoginRefusal::Inactive));
    }

    #[test]
    fn admins_need_no_profile_verification() {
        assert_eq!(user(Role::Admin, true).login_refusal(None), None);
        assert_eq!(user(Role::SuperAdmin, true).login_refusal(None), None);
    }
}
