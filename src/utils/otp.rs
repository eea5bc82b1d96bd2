use hmac::{Hmac, Mac};
use rand::{thread_rng, Rng};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::models::otp::OtpPurpose;

type HmacSha256 = Hmac<Sha256>;

/// Six-digit numeric code, never starting with zero.
pub fn generate_code() -> String {
    thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Codes are stored as HMAC-SHA256 over email, purpose and code so a leaked
/// table does not reveal live codes.
pub fn hash_code(secret: &str, email: &str, purpose: OtpPurpose, code: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Internal(format!("otp hmac key: {}", e)))?;
    mac.update(email.trim().to_lowercase().as_bytes());
    mac.update(b"\n");
    mac.update(purpose.as_str().as_bytes());
    mac.update(b"\n");
    mac.update(code.trim().as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn hashes_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..200 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn hash_binds_email_and_purpose() {
        let base = hash_code("k", "a@x.edu", OtpPurpose::Registration, "123456").unwrap();
        assert_eq!(base, hash_code("k", "A@X.edu ", OtpPurpose::Registration, "123456").unwrap());
        assert_ne!(base, hash_code("k", "b@x.edu", OtpPurpose::Registration, "123456").unwrap());
        assert_ne!(base, hash_code("k", "a@x.edu", OtpPurpose::PasswordReset, "123456").unwrap());
        assert_ne!(base, hash_code("other", "a@x.edu", OtpPurpose::Registration, "123456").unwrap());
    }

    #[test]
    fn comparison_requires_exact_match() {
        let a = hash_code("k", "a@x.edu", OtpPurpose::Registration, "123456").unwrap();
        let b = hash_code("k", "a@x.edu", OtpPurpose::Registration, "000000").unwrap();
        assert!(hashes_match(&a, &a.clone()));
        assert!(!hashes_match(&a, &b));
        assert!(!hashes_match(&a, ""));
    }
}
