use chrono::{Datelike, NaiveDate};

use crate::models::ValidationResult;

pub const MINIMUM_AGE: i32 = 18;

pub fn parse_birth_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Whole years between `birth_date` and `today`; the current year only counts
/// once its month and day have been reached.
pub fn age_in_years(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    let mut years = today.year() - birth_date.year();
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        years -= 1;
    }
    years
}

pub fn validate_age(birth_date: Option<NaiveDate>, today: NaiveDate) -> ValidationResult {
    let Some(birth_date) = birth_date else {
        return ValidationResult::invalid("Birth date is required");
    };

    if birth_date > today {
        return ValidationResult::invalid("Birth date cannot be in the future");
    }

    if age_in_years(birth_date, today) < MINIMUM_AGE {
        return ValidationResult::invalid(format!("Patient must be at least {} years old", MINIMUM_AGE));
    }

    ValidationResult::ok()
}

pub fn validate_birth_date(raw: &str, today: NaiveDate) -> ValidationResult {
    if raw.trim().is_empty() {
        return ValidationResult::invalid("Birth date is required");
    }

    match parse_birth_date(raw) {
        Some(birth_date) => validate_age(Some(birth_date), today),
        None => ValidationResult::invalid("Birth date must use the YYYY-MM-DD format"),
    }
}
