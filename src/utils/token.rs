use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::role::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    pub exp: usize,
}

pub fn issue_token(
    secret: &str,
    user_id: Uuid,
    role: Role,
    ttl_hours: i64,
) -> jsonwebtoken::errors::Result<String> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp().max(0) as usize;
    let claims = Claims {
        sub: user_id,
        role,
        exp,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Fails on bad signature, expiry, or a role outside the closed set.
pub fn decode_token(secret: &str, token: &str) -> jsonwebtoken::errors::Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}
