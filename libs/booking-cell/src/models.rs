use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use availability_cell::{AvailabilitySlot, Practitioner};
use payment_cell::PayerDetails;
use shared_models::AppError;

// ==============================================================================
// STEPS AND MODES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Entry,
    Specialty,
    Practitioner,
    PractitionerDetail,
    Slot,
    PatientIntake,
    Payment,
    Confirmation,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::Entry => "Start",
            Step::Specialty => "Specialty",
            Step::Practitioner => "Practitioner",
            Step::PractitionerDetail => "Practitioner profile",
            Step::Slot => "Date and time",
            Step::PatientIntake => "Patient details",
            Step::Payment => "Payment",
            Step::Confirmation => "Confirmation",
        }
    }

    /// Steps after which the session is worth persisting for draft recovery.
    pub fn is_checkpoint(&self) -> bool {
        matches!(
            self,
            Step::Practitioner | Step::Slot | Step::PatientIntake | Step::Payment
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    None,
    ByPractitioner,
    BySpecialty,
}

// ==============================================================================
// PATIENT
// ==============================================================================

/// Patient details exactly as typed in the intake form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatientDraft {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub national_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub home_address: Option<String>,
}

/// A patient whose every field passed validation. Only the intake validator
/// builds one; re-submitting the intake step replaces it as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) national_id: String,
    pub(crate) email: String,
    pub(crate) phone: String,
    pub(crate) birth_date: NaiveDate,
    pub(crate) home_address: Option<String>,
}

impl PatientRecord {
    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn national_id(&self) -> &str {
        &self.national_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn home_address(&self) -> Option<&str> {
        self.home_address.as_deref()
    }

    pub fn payer_details(&self) -> PayerDetails {
        PayerDetails {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            national_id: self.national_id.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            birth_date: self.birth_date,
        }
    }
}

// ==============================================================================
// SESSION
// ==============================================================================

/// One booking attempt. Only the controller mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingSession {
    pub(crate) id: Uuid,
    pub(crate) mode: SearchMode,
    pub(crate) step: Step,
    pub(crate) specialty: Option<String>,
    pub(crate) practitioner: Option<Practitioner>,
    pub(crate) slot: Option<AvailabilitySlot>,
    pub(crate) patient: Option<PatientRecord>,
    pub(crate) booking_reference: Option<i64>,
    pub(crate) created_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mode: SearchMode::None,
            step: Step::Entry,
            specialty: None,
            practitioner: None,
            slot: None,
            patient: None,
            booking_reference: None,
            created_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }

    pub fn practitioner(&self) -> Option<&Practitioner> {
        self.practitioner.as_ref()
    }

    pub fn slot(&self) -> Option<&AvailabilitySlot> {
        self.slot.as_ref()
    }

    pub fn patient(&self) -> Option<&PatientRecord> {
        self.patient.as_ref()
    }

    pub fn booking_reference(&self) -> Option<i64> {
        self.booking_reference
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Check the selection chain and what the current step requires.
    pub fn check_invariants(&self) -> Result<(), BookingError> {
        let violation = |message: &str| Err(BookingError::InvariantViolation(message.to_string()));

        if self.slot.is_some() && self.practitioner.is_none() {
            return violation("slot selected without a practitioner");
        }
        if self.patient.is_some() && self.slot.is_none() {
            return violation("patient attached without a slot");
        }
        if self.specialty.is_some() && self.mode != SearchMode::BySpecialty {
            return violation("specialty set outside by-specialty mode");
        }
        if self.booking_reference.is_some() && self.step != Step::Confirmation {
            return violation("booking reference before confirmation");
        }

        if let (Some(practitioner), Some(slot)) = (&self.practitioner, &self.slot) {
            if slot.practitioner_id != practitioner.id {
                return violation("slot belongs to another practitioner");
            }
            if !slot.is_well_formed() {
                return violation("slot ends before it starts");
            }
        }

        if let (Some(specialty), Some(practitioner)) = (&self.specialty, &self.practitioner) {
            if !practitioner.matches_specialty(specialty) {
                return violation("practitioner does not offer the selected specialty");
            }
        }

        if self.step < Step::PatientIntake && (self.slot.is_some() || self.patient.is_some()) {
            return violation("slot or patient kept before the slot step completed");
        }

        let satisfied = match self.step {
            Step::Entry => self.mode == SearchMode::None && self.practitioner.is_none(),
            Step::Specialty => self.mode == SearchMode::BySpecialty && self.practitioner.is_none(),
            Step::Practitioner => match self.mode {
                SearchMode::None => false,
                SearchMode::ByPractitioner => true,
                SearchMode::BySpecialty => self.specialty.is_some(),
            },
            Step::PractitionerDetail | Step::Slot => self.practitioner.is_some(),
            Step::PatientIntake => self.slot.is_some(),
            Step::Payment | Step::Confirmation => self.patient.is_some(),
        };

        if !satisfied {
            return violation("selections missing for the current step");
        }

        Ok(())
    }
}

// ==============================================================================
// EVENTS
// ==============================================================================

#[derive(Debug, Clone)]
pub enum BookingEvent {
    ChooseMode(SearchMode),
    SelectSpecialty(String),
    SelectPractitioner {
        practitioner: Practitioner,
        view_profile: bool,
    },
    ContinueFromProfile,
    SelectSlot(AvailabilitySlot),
    SubmitPatient(PatientRecord),
    Confirm {
        booking_reference: Option<i64>,
    },
    SlotLost,
    Back,
}

impl BookingEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BookingEvent::ChooseMode(_) => "choose_mode",
            BookingEvent::SelectSpecialty(_) => "select_specialty",
            BookingEvent::SelectPractitioner { .. } => "select_practitioner",
            BookingEvent::ContinueFromProfile => "continue",
            BookingEvent::SelectSlot(_) => "select_slot",
            BookingEvent::SubmitPatient(_) => "submit_patient",
            BookingEvent::Confirm { .. } => "confirm",
            BookingEvent::SlotLost => "slot_lost",
            BookingEvent::Back => "back",
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("{} field(s) failed validation", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Network(String),

    #[error("Invalid booking transition: {0}")]
    InvariantViolation(String),
}

impl BookingError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        BookingError::Validation(vec![FieldError::new(field, message)])
    }
}

impl From<BookingError> for AppError {
    fn from(error: BookingError) -> Self {
        match error {
            BookingError::Validation(fields) => AppError::InvalidFields(
                fields
                    .into_iter()
                    .map(|field| (field.field, field.message))
                    .collect(),
            ),
            BookingError::NotFound(message) => AppError::NotFound(message),
            BookingError::Network(message) => AppError::ExternalService(message),
            BookingError::InvariantViolation(message) => AppError::Conflict(message),
        }
    }
}

// ==============================================================================
// REQUEST BODIES
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct ChooseModeRequest {
    pub mode: SearchMode,
}

#[derive(Debug, Deserialize)]
pub struct SelectSpecialtyRequest {
    pub specialty: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectPractitionerRequest {
    pub practitioner_id: i64,
    #[serde(default)]
    pub view_profile: bool,
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    #[serde(default)]
    pub period: availability_cell::DayPeriod,
    /// IANA zone name, e.g. `America/Santiago`.
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectSlotRequest {
    pub date_key: availability_cell::DateKey,
    pub slot_id: i64,
    pub timezone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPatientRequest {
    #[serde(flatten)]
    pub patient: PatientDraft,
    pub timezone: Option<String>,
}
