//! Input validation for C9's entry points. Kept free of any store access so
//! it can run before anything touches a repository.

use crate::error::AuthError;
use regex::Regex;
use std::sync::OnceLock;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

fn phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap())
}

/// Trims and lowercases an email, then checks format. Rejects outright if
/// the result doesn't look like an email.
pub fn normalize_and_validate_email(raw: &str) -> Result<String, AuthError> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AuthError::Validation { field: "email", reason: "must not be empty" });
    }
    if !email_re().is_match(&normalized) {
        return Err(AuthError::Validation { field: "email", reason: "not a valid email address" });
    }
    Ok(normalized)
}

/// `>= 12 chars` and contains at least one uppercase, lowercase, digit, and
/// symbol. No upper bound — bcrypt truncates beyond 72 bytes, which is the
/// hasher's problem, not validation's.
pub fn validate_password_strength(password: &str) -> Result<(), AuthError> {
    let weak = AuthError::Validation { field: "password", reason: "too weak" };
    if password.chars().count() < 12 {
        return Err(weak);
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());
    if has_upper && has_lower && has_digit && has_symbol {
        Ok(())
    } else {
        Err(weak)
    }
}

/// 10-15 digits, optional leading `+`.
pub fn validate_phone(phone: &str) -> Result<(), AuthError> {
    if phone_re().is_match(phone) {
        Ok(())
    } else {
        Err(AuthError::Validation { field: "phone", reason: "must be 10-15 digits, optional leading +" })
    }
}

/// Device fingerprint normalization for Login's device get-or-create step:
/// empty after trimming becomes the literal `"password-login"`.
pub fn normalize_device_fingerprint(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(fp) if !fp.is_empty() => fp.to_string(),
        _ => "password-login".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_and_validate_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
    }

    #[test]
    fn rejects_malformed_email() {
        assert!(normalize_and_validate_email("not-an-email").is_err());
        assert!(normalize_and_validate_email("").is_err());
    }

    #[test]
    fn password_strength_requires_all_classes() {
        assert!(validate_password_strength("Passw0rd!Pass!").is_ok());
        assert!(validate_password_strength("alllowercase123!").is_err());
        assert!(validate_password_strength("Short1!").is_err());
        assert!(validate_password_strength("NoSymbolsHere1234").is_err());
    }

    #[test]
    fn phone_accepts_digits_and_optional_plus() {
        assert!(validate_phone("+15551234567").is_ok());
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("123").is_err());
        assert!(validate_phone("abc1234567890").is_err());
    }

    #[test]
    fn fingerprint_falls_back_to_password_login() {
        assert_eq!(normalize_device_fingerprint(None), "password-login");
        assert_eq!(normalize_device_fingerprint(Some("  ")), "password-login");
        assert_eq!(normalize_device_fingerprint(Some(" fp-1 ")), "fp-1");
    }
}
