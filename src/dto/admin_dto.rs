use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::smtp_settings::SmtpSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatusResponse {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ActivityLogQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSmtpSettingsPayload {
    #[validate(length(min = 1))]
    pub host: String,
    #[validate(range(min = 1, max = 65535))]
    pub port: i32,
    pub username: String,
    /// Omitted keeps the stored password.
    pub password: Option<String>,
    #[validate(email)]
    pub from_address: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettingsResponse {
    pub host: String,
    pub port: i32,
    pub username: String,
    pub password_set: bool,
    pub from_address: String,
    pub enabled: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<SmtpSettings> for SmtpSettingsResponse {
    fn from(value: SmtpSettings) -> Self {
        Self {
            host: value.host,
            port: value.port,
            username: value.username,
            password_set: !value.password.is_empty(),
            from_address: value.from_address,
            enabled: value.enabled,
            updated_at: value.updated_at,
        }
    }
}
