#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use availability_cell::{AvailabilitySlot, Practitioner, SlotStatus};
use booking_cell::services::intake::PatientIntakeValidator;
use booking_cell::{PatientDraft, PatientRecord};
use identity_cell::models::PhoneRules;

pub fn practitioner(id: i64, specialty: &str) -> Practitioner {
    Practitioner {
        id,
        first_name: "Ana".to_string(),
        last_name: "Rojas".to_string(),
        specialty: Some(specialty.to_string()),
        photo_url: None,
        consultation_price: Some(30_000),
        offers_clinic: true,
        offers_home_visit: false,
        commune: Some("Providencia".to_string()),
        region: Some("Metropolitana".to_string()),
    }
}

pub fn slot_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, 12, 13, 0, 0).unwrap()
}

pub fn slot(id: i64, practitioner_id: i64, status: SlotStatus) -> AvailabilitySlot {
    let start = slot_start() + Duration::hours(id);
    AvailabilitySlot::new(id, practitioner_id, start, start + Duration::minutes(45), status).unwrap()
}

pub fn valid_draft() -> PatientDraft {
    PatientDraft {
        first_name: "ana".to_string(),
        last_name: "rojas".to_string(),
        national_id: "12.345.678-5".to_string(),
        email: "ana@correo.cl".to_string(),
        phone: "+56 9 1234 5678".to_string(),
        birth_date: "1990-05-04".to_string(),
        home_address: None,
    }
}

pub fn patient() -> PatientRecord {
    PatientIntakeValidator::with_rules(PhoneRules::default())
        .validate(&valid_draft(), NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
        .unwrap()
}
