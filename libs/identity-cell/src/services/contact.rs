use std::sync::LazyLock;

use regex::Regex;

use crate::models::{PhoneRules, ValidationResult};

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_DOMAIN_LENGTH: usize = 253;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
});

pub fn validate_email(raw: &str) -> ValidationResult {
    let email = raw.trim();

    if email.is_empty() {
        return ValidationResult::invalid("Email is required");
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return ValidationResult::invalid("Email is too long");
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty() => {
            (local, domain)
        }
        _ => return ValidationResult::invalid("Invalid email format"),
    };

    if local.len() > MAX_LOCAL_PART_LENGTH {
        return ValidationResult::invalid("Email user name is too long");
    }

    if domain.len() > MAX_DOMAIN_LENGTH {
        return ValidationResult::invalid("Email domain is too long");
    }

    if !EMAIL_PATTERN.is_match(email) {
        return ValidationResult::invalid("Invalid email format");
    }

    ValidationResult::ok()
}

/// Force the fixed country prefix and keep only the digits typed after it.
pub fn normalize_phone(raw: &str, rules: &PhoneRules) -> String {
    let trimmed = raw.trim();
    let rest = trimmed.strip_prefix(rules.prefix.as_str()).unwrap_or(trimmed);

    let mut normalized = rules.prefix.clone();
    normalized.extend(rest.chars().filter(|c| c.is_ascii_digit()));
    normalized
}

pub fn validate_phone(raw: &str, rules: &PhoneRules) -> ValidationResult {
    let normalized = normalize_phone(raw, rules);

    if normalized == rules.prefix {
        return ValidationResult::invalid("Phone is required");
    }

    if normalized.chars().count() != rules.expected_length() {
        return ValidationResult::invalid(format!(
            "Phone must have {} digits after {}",
            rules.subscriber_digits, rules.prefix
        ));
    }

    ValidationResult::ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_rules() {
        assert!(validate_email("ana.perez@clinica.cl").valid);
        assert!(validate_email("  ana@clinica.cl ").valid);
        assert!(!validate_email("").valid);
        assert!(!validate_email("ana@@clinica.cl").valid);
        assert!(!validate_email("ana@clinica").valid);
        assert!(!validate_email("@clinica.cl").valid);
        assert!(!validate_email("ana pérez@clinica.cl").valid);
    }

    #[test]
    fn test_email_length_limits() {
        let long_local = format!("{}@clinica.cl", "a".repeat(65));
        assert_eq!(
            validate_email(&long_local).message.as_deref(),
            Some("Email user name is too long")
        );

        let long_domain = format!("ana@{}.cl", "d".repeat(250));
        assert_eq!(
            validate_email(&long_domain).message.as_deref(),
            Some("Email is too long")
        );

        let max_local = format!("{}@clinica.cl", "a".repeat(64));
        assert!(validate_email(&max_local).valid);
    }

    #[test]
    fn test_phone_normalization() {
        let rules = PhoneRules::default();
        assert_eq!(normalize_phone("+56 9 1234 5678", &rules), "+56912345678");
        assert_eq!(normalize_phone("9-1234-5678", &rules), "+56912345678");
        assert_eq!(normalize_phone("", &rules), "+56");
    }

    #[test]
    fn test_phone_length() {
        let rules = PhoneRules::default();
        assert!(validate_phone("+56912345678", &rules).valid);
        assert!(!validate_phone("+5691234567", &rules).valid);
        assert!(!validate_phone("+569123456789", &rules).valid);
        assert_eq!(
            validate_phone("  ", &rules).message.as_deref(),
            Some("Phone is required")
        );
    }

    #[test]
    fn test_custom_prefix() {
        let rules = PhoneRules::with_prefix("+54");
        assert!(validate_phone("+54 9 1234 5678", &rules).valid);
    }
}
