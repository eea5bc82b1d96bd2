use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roll_number: String,
    pub phone: String,
    pub branch: String,
    pub year: i32,
    pub cgpa: Decimal,
    pub passing_year: i32,
    pub degree_type: String,
    pub is_email_verified: bool,
    pub is_verified_by_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
