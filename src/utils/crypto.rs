use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::error::{Error, Result};

// 19 MiB, 2 passes, 1 lane.
const MEMORY_KIB: u32 = 19 * 1024;
const ITERATIONS: u32 = 2;
const PARALLELISM: u32 = 1;

fn argon2id() -> Result<Argon2<'static>> {
    let params = Params::new(MEMORY_KIB, ITERATIONS, PARALLELISM, None)
        .map_err(|e| Error::Internal(format!("argon2 params: {}", e)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// PHC string with a fresh salt.
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2id()?.hash_password(plain.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// A stored hash that does not parse never matches.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool> {
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(error = %err, "stored password hash is malformed");
            return Ok(false);
        }
    };
    Ok(argon2id()?
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
