use chrono::NaiveDate;
use tracing::debug;

use identity_cell::models::{PhoneRules, ValidationResult};
use identity_cell::services::{
    age::{parse_birth_date, validate_birth_date},
    contact::{normalize_phone, validate_email, validate_phone},
    names::{normalize_name, validate_home_address, validate_name},
    national_id::{clean_national_id, validate_national_id},
};
use shared_config::AppConfig;

use crate::models::{BookingError, FieldError, PatientDraft, PatientRecord};

/// Gate for the patient intake step: every field goes through the identity
/// validators and all failures are reported together.
#[derive(Debug, Clone)]
pub struct PatientIntakeValidator {
    phone_rules: PhoneRules,
}

impl PatientIntakeValidator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            phone_rules: PhoneRules::with_prefix(config.phone_country_prefix.clone()),
        }
    }

    pub fn with_rules(phone_rules: PhoneRules) -> Self {
        Self { phone_rules }
    }

    pub fn validate(&self, draft: &PatientDraft, today: NaiveDate) -> Result<PatientRecord, BookingError> {
        let home_address = draft
            .home_address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty());

        let checks: [(&str, ValidationResult); 7] = [
            ("first_name", validate_name(&draft.first_name, "First name")),
            ("last_name", validate_name(&draft.last_name, "Last name")),
            ("national_id", validate_national_id(&draft.national_id)),
            ("email", validate_email(&draft.email)),
            ("phone", validate_phone(&draft.phone, &self.phone_rules)),
            ("birth_date", validate_birth_date(&draft.birth_date, today)),
            ("home_address", validate_home_address(home_address)),
        ];

        let errors: Vec<FieldError> = checks
            .into_iter()
            .filter(|(_, result)| !result.valid)
            .map(|(field, result)| {
                FieldError::new(field, result.message.unwrap_or_else(|| "Invalid value".to_string()))
            })
            .collect();

        if !errors.is_empty() {
            debug!("Patient intake rejected with {} invalid fields", errors.len());
            return Err(BookingError::Validation(errors));
        }

        let birth_date = parse_birth_date(&draft.birth_date)
            .ok_or_else(|| BookingError::field("birth_date", "Birth date must use the YYYY-MM-DD format"))?;

        Ok(PatientRecord {
            first_name: normalize_name(&draft.first_name),
            last_name: normalize_name(&draft.last_name),
            national_id: clean_national_id(&draft.national_id),
            email: draft.email.trim().to_string(),
            phone: normalize_phone(&draft.phone, &self.phone_rules),
            birth_date,
            home_address: home_address.map(str::to_string),
        })
    }
}
