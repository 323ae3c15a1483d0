use tracing::instrument;

use crate::models::{PasswordRequirements, PasswordStrength, PasswordValidation};

pub const MIN_PASSWORD_LENGTH: usize = 8;
const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

pub fn password_requirements(password: &str) -> PasswordRequirements {
    PasswordRequirements {
        min_length: password.chars().count() >= MIN_PASSWORD_LENGTH,
        has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
        has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
        has_digit: password.chars().any(|c| c.is_ascii_digit()),
        has_special: password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
    }
}

pub fn strength_for(satisfied: usize) -> Option<PasswordStrength> {
    match satisfied {
        0 => None,
        1 | 2 => Some(PasswordStrength::Weak),
        3 => Some(PasswordStrength::Medium),
        _ => Some(PasswordStrength::Strong),
    }
}

#[instrument(skip_all)]
pub fn evaluate_password(password: &str) -> PasswordValidation {
    let requirements = password_requirements(password);
    let satisfied = requirements.satisfied_count();
    let valid = requirements.min_length && satisfied >= 3;

    let message = if password.is_empty() {
        Some("Password is required".to_string())
    } else if !requirements.min_length {
        Some(format!(
            "Password must have at least {} characters",
            MIN_PASSWORD_LENGTH
        ))
    } else if !valid {
        Some("Password must combine upper and lower case letters, digits or symbols".to_string())
    } else {
        None
    };

    PasswordValidation {
        valid,
        strength: strength_for(satisfied),
        message,
        requirements,
        satisfied,
    }
}
