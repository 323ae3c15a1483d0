use crate::models::ValidationResult;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_ADDRESS_LENGTH: usize = 200;

/// Uppercase the first letter of every word and lowercase the rest.
pub fn capitalize_words(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop anything that is not a letter or a space, then capitalize.
pub fn normalize_name(raw: &str) -> String {
    let letters: String = raw
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect();
    capitalize_words(&letters)
}

pub fn validate_name(raw: &str, label: &str) -> ValidationResult {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return ValidationResult::invalid(format!("{} is required", label));
    }

    if !trimmed.chars().all(|c| c.is_alphabetic() || c.is_whitespace()) {
        return ValidationResult::invalid(format!("{} may only contain letters and spaces", label));
    }

    if trimmed.chars().count() < MIN_NAME_LENGTH {
        return ValidationResult::invalid(format!(
            "{} must have at least {} characters",
            label, MIN_NAME_LENGTH
        ));
    }

    ValidationResult::ok()
}

pub fn validate_home_address(address: Option<&str>) -> ValidationResult {
    let Some(address) = address else {
        return ValidationResult::ok();
    };

    let trimmed = address.trim();
    if trimmed.is_empty() {
        return ValidationResult::invalid("Home address must not be blank");
    }

    if trimmed.chars().count() > MAX_ADDRESS_LENGTH {
        return ValidationResult::invalid(format!(
            "Home address must not exceed {} characters",
            MAX_ADDRESS_LENGTH
        ));
    }

    ValidationResult::ok()
}
