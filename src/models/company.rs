use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub company_name: String,
    pub website: String,
    pub description: String,
    pub contact_person: String,
    pub phone: String,
    pub is_email_verified: bool,
    pub is_verified_by_admin: bool,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
