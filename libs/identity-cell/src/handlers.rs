use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_utils::clock::{local_today, parse_timezone};

use crate::models::{
    AgeValidation, BirthDateRequest, FileValidation, FileValidationRequest, FormattedNationalId,
    PasswordValidation, PhoneRules, PhoneValidation, ValidationResult, ValueRequest,
};
use crate::services::{
    age::{age_in_years, parse_birth_date, validate_birth_date},
    contact::{normalize_phone, validate_email, validate_phone},
    files::{format_file_size, validate_file},
    national_id::{clean_national_id, format_national_id, validate_national_id},
    password::evaluate_password,
};

#[axum::debug_handler]
pub async fn validate_national_id_handler(
    Json(request): Json<ValueRequest>,
) -> Json<ValidationResult> {
    Json(validate_national_id(&request.value))
}

#[axum::debug_handler]
pub async fn format_national_id_handler(
    Json(request): Json<ValueRequest>,
) -> Json<FormattedNationalId> {
    Json(FormattedNationalId {
        formatted: format_national_id(&request.value),
        cleaned: clean_national_id(&request.value),
    })
}

#[axum::debug_handler]
pub async fn validate_email_handler(Json(request): Json<ValueRequest>) -> Json<ValidationResult> {
    Json(validate_email(&request.value))
}

#[axum::debug_handler]
pub async fn validate_phone_handler(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<ValueRequest>,
) -> Json<PhoneValidation> {
    let rules = PhoneRules::with_prefix(config.phone_country_prefix.clone());

    Json(PhoneValidation {
        result: validate_phone(&request.value, &rules),
        normalized: normalize_phone(&request.value, &rules),
    })
}

#[axum::debug_handler]
pub async fn validate_birth_date_handler(
    State(config): State<Arc<AppConfig>>,
    Json(request): Json<BirthDateRequest>,
) -> Json<AgeValidation> {
    let timezone = parse_timezone(request.timezone.as_deref(), config.default_timezone)
        .unwrap_or_else(|e| {
            warn!("{}, using {}", e, config.default_timezone);
            config.default_timezone
        });
    let today = local_today(&timezone, Utc::now());
    debug!("Validating birth date against local day {}", today);

    let birth_date = parse_birth_date(&request.birth_date);

    Json(AgeValidation {
        result: validate_birth_date(&request.birth_date, today),
        age: birth_date
            .filter(|date| *date <= today)
            .map(|date| age_in_years(date, today)),
        birth_date,
    })
}

#[axum::debug_handler]
pub async fn password_strength_handler(
    Json(request): Json<ValueRequest>,
) -> Json<PasswordValidation> {
    Json(evaluate_password(&request.value))
}

#[axum::debug_handler]
pub async fn validate_file_handler(
    Json(request): Json<FileValidationRequest>,
) -> Json<FileValidation> {
    let rules = request.rules();

    Json(FileValidation {
        result: validate_file(request.file.as_ref(), &rules),
        size: request.file.as_ref().map(|file| format_file_size(file.size_bytes)),
    })
}
