use tracing::debug;

use crate::models::ValidationResult;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 9;
const MAX_BODY_DIGITS: usize = 8;
const WEIGHTS: [u32; 6] = [2, 3, 4, 5, 6, 7];

fn is_separator(c: char) -> bool {
    c == '.' || c == '-' || c.is_whitespace()
}

/// Strip separators and uppercase the check digit. This is the form sent to
/// the payment collaborator.
pub fn clean_national_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| !is_separator(*c))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Modulo-11 check digit for an all-digit body, read right to left with
/// cyclic weights 2..=7. Returns `None` for an empty or non-digit body.
pub fn compute_check_digit(body: &str) -> Option<char> {
    if body.is_empty() {
        return None;
    }

    let mut sum = 0u32;
    for (position, c) in body.chars().rev().enumerate() {
        let digit = c.to_digit(10)?;
        sum += digit * WEIGHTS[position % WEIGHTS.len()];
    }

    match 11 - (sum % 11) {
        11 => Some('0'),
        10 => Some('K'),
        n => char::from_digit(n, 10),
    }
}

pub fn validate_national_id(raw: &str) -> ValidationResult {
    let cleaned = clean_national_id(raw);

    if cleaned.is_empty() {
        return ValidationResult::invalid("National ID is required");
    }

    let length = cleaned.chars().count();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
        debug!("National ID rejected: {} characters after cleaning", length);
        return ValidationResult::invalid("National ID must have 8 or 9 characters");
    }

    let mut chars = cleaned.chars();
    let check_digit = match chars.next_back() {
        Some(c) => c,
        None => return ValidationResult::invalid("National ID is required"),
    };
    let body = chars.as_str();

    if !body.chars().all(|c| c.is_ascii_digit()) {
        return ValidationResult::invalid("National ID body must contain only digits");
    }

    match compute_check_digit(body) {
        Some(expected) if expected == check_digit => ValidationResult::ok(),
        _ => ValidationResult::invalid("Invalid national ID"),
    }
}

/// Group the body in thousands and append the check digit, as typed.
///
/// Input is sanitized first: only digits and `K` survive, a `K` is only kept in
/// the check-digit position and the body is capped at eight digits. The output
/// is therefore always a fixed point of this function.
pub fn format_national_id(raw: &str) -> String {
    let kept: Vec<char> = raw
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_ascii_digit() || *c == 'K')
        .collect();

    let Some((check_digit, rest)) = kept.split_last() else {
        return String::new();
    };

    let body: Vec<char> = rest
        .iter()
        .copied()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_BODY_DIGITS)
        .collect();

    if body.is_empty() {
        return String::new();
    }

    let mut grouped = String::with_capacity(body.len() + body.len() / 3 + 2);
    for (index, digit) in body.iter().enumerate() {
        if index > 0 && (body.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(*digit);
    }

    grouped.push('-');
    grouped.push(*check_digit);
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_valid_and_invalid_ids() {
        assert!(validate_national_id("12345678-5").valid);
        assert!(validate_national_id("12.345.678-5").valid);
        assert!(!validate_national_id("12345678-0").valid);
        assert!(!validate_national_id("1234567-").valid);
        assert!(!validate_national_id("ABCDEFGH-5").valid);
    }

    #[test]
    fn test_check_digit_mapping() {
        // 12345678 -> weighted sum 138 -> remainder 6 -> 5
        assert_eq!(compute_check_digit("12345678"), Some('5'));
        // remainder 1 -> 10 -> K
        assert_eq!(compute_check_digit("10000013"), Some('K'));
        // remainder 0 -> 11 -> 0
        assert_eq!(compute_check_digit("10000004"), Some('0'));
        assert_eq!(compute_check_digit(""), None);
        assert_eq!(compute_check_digit("12a"), None);
    }

    #[test]
    fn test_lowercase_k_is_accepted() {
        assert!(validate_national_id("10.000.013-k").valid);
        assert!(validate_national_id("10000013K").valid);
    }

    #[test]
    fn test_empty_is_required() {
        let result = validate_national_id("  .-  ");
        assert!(!result.valid);
        assert_eq!(result.message.as_deref(), Some("National ID is required"));
    }

    #[test]
    fn test_format_groups_incrementally() {
        assert_eq!(format_national_id(""), "");
        assert_eq!(format_national_id("1"), "");
        assert_eq!(format_national_id("K"), "");
        assert_eq!(format_national_id("12"), "1-2");
        assert_eq!(format_national_id("1234"), "123-4");
        assert_eq!(format_national_id("12345"), "1.234-5");
        assert_eq!(format_national_id("123456785"), "12.345.678-5");
        assert_eq!(format_national_id("10000013k"), "10.000.013-K");
    }

    #[test]
    fn test_format_strips_noise_and_caps_body() {
        assert_eq!(format_national_id("12a34-5"), "1.234-5");
        assert_eq!(format_national_id("1K234-5"), "1.234-5");
        assert_eq!(format_national_id("1234567899-9"), "12.345.678-9");
    }

    #[test]
    fn test_clean_keeps_check_digit_uppercase() {
        assert_eq!(clean_national_id("10.000.013-k"), "10000013K");
    }
}
