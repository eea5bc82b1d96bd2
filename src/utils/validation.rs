use validator::ValidationError;

/// At least ten digits once separators are ignored.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let only_phone_chars = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if digits >= 10 && only_phone_chars {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == 6 && code.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::new("otp_format"))
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

pub fn validate_non_empty_set(values: &[String]) -> Result<(), ValidationError> {
    if values.is_empty() || values.iter().any(|v| v.trim().is_empty()) {
        Err(ValidationError::new("eligible_set"))
    } else {
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_needs_ten_digits() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+91 98765-43210").is_ok());
        assert!(validate_phone("987654321").is_err());
        assert!(validate_phone("98765abc43210").is_err());
    }

    #[test]
    fn otp_code_is_six_digits() {
        assert!(validate_otp_code("123456").is_ok());
        assert!(validate_otp_code("12345").is_err());
        assert!(validate_otp_code("12345a").is_err());
    }

    #[test]
    fn eligible_sets_cannot_be_empty() {
        assert!(validate_non_empty_set(&["CSE".to_string()]).is_ok());
        assert!(validate_non_empty_set(&[]).is_err());
        assert!(validate_non_empty_set(&[" ".to_string()]).is_err());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  A@X.Edu "), "a@x.edu");
    }
}
