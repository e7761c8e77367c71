//! Input normalisation for provider requests.
//!
//! Each normaliser either returns the exact value sent upstream or a
//! `VerificationError::Validation`; a validation failure means the provider
//! is never called and spends no rate-limit budget.

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::VerificationError;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_regex() -> Option<&'static Regex> {
    static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
}

fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Strips formatting from a national identity number; must leave 12 digits.
///
/// `"1234-5678-9012"` → `"123456789012"`.
pub fn normalize_identity_number(raw: &str) -> Result<String, VerificationError> {
    let clean = digits(raw);
    if clean.len() != 12 {
        return Err(VerificationError::Validation(
            "Invalid Aadhaar number. Must be 12 digits.".to_string(),
        ));
    }
    Ok(clean)
}

/// Uppercases a tax ID and drops anything that is not `A-Z0-9`; must leave 10 characters.
pub fn normalize_tax_id(raw: &str) -> Result<String, VerificationError> {
    let clean: String = raw
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect();
    if clean.len() != 10 {
        return Err(VerificationError::Validation(
            "Invalid PAN number. Must be 10 characters.".to_string(),
        ));
    }
    Ok(clean)
}

/// Strips formatting from a phone number; must leave 10 digits.
pub fn normalize_phone(raw: &str) -> Result<String, VerificationError> {
    let clean = digits(raw);
    if clean.len() != 10 {
        return Err(VerificationError::Validation(
            "Invalid phone number. Must be 10 digits.".to_string(),
        ));
    }
    Ok(clean)
}

/// Shape check only: something, `@`, something, `.`, something, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(email))
}

/// Returns the email unchanged when it passes [`is_valid_email`].
pub fn validate_email(raw: &str) -> Result<String, VerificationError> {
    if !is_valid_email(raw) {
        tracing::warn!("Rejected email of {} characters: invalid format", raw.chars().count());
        return Err(VerificationError::Validation(
            "Invalid email format.".to_string(),
        ));
    }
    Ok(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_number_formats() {
        assert_eq!(
            normalize_identity_number("1234-5678-9012").unwrap(),
            "123456789012"
        );
        assert_eq!(
            normalize_identity_number("1234 5678 9012").unwrap(),
            "123456789012"
        );
        assert!(normalize_identity_number("12345678901").is_err());
        assert!(normalize_identity_number("1234567890123").is_err());
        assert!(normalize_identity_number("").is_err());
    }

    #[test]
    fn test_tax_id_is_uppercased_and_stripped() {
        assert_eq!(normalize_tax_id("abcde1234f").unwrap(), "ABCDE1234F");
        assert_eq!(normalize_tax_id("ABCDE-1234-F").unwrap(), "ABCDE1234F");
        assert!(normalize_tax_id("ABCDE1234").is_err());
        assert!(normalize_tax_id("ABCDE1234FG").is_err());
    }

    #[test]
    fn test_phone_numbers() {
        assert_eq!(normalize_phone("98765 43210").unwrap(), "9876543210");
        assert_eq!(normalize_phone("(987) 654-3210").unwrap(), "9876543210");
        assert!(normalize_phone("+91 98765 43210").is_err());
        assert!(normalize_phone("12345").is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("tenant@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co.in"));
        assert!(!is_valid_email("tenant@example"));
        assert!(!is_valid_email("tenant example@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email(""));

        let err = validate_email("not-an-email").unwrap_err();
        assert_eq!(err.to_string(), "Invalid email format.");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rejected_email_is_not_logged() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            assert!(validate_email("asha.rao@@private-mail").is_err());
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("invalid format"));
        assert!(!output.contains("asha.rao"));
    }

    #[test]
    fn test_validation_errors_are_error_status() {
        let err = normalize_identity_number("123").unwrap_err();
        assert!(matches!(err, VerificationError::Validation(_)));
        assert_eq!(err.to_string(), "Invalid Aadhaar number. Must be 12 digits.");
    }
}
