use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

// ==============================================================================
// SLOTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    #[serde(alias = "disponible")]
    Available,
    #[serde(alias = "reservado")]
    Reserved,
    #[serde(alias = "no_disponible")]
    Unavailable,
    #[serde(alias = "expirado")]
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: i64,
    pub practitioner_id: i64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub status: SlotStatus,
}

impl AvailabilitySlot {
    pub fn new(
        id: i64,
        practitioner_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: SlotStatus,
    ) -> Result<Self, SlotError> {
        let slot = Self {
            id,
            practitioner_id,
            start,
            end,
            status,
        };

        if !slot.is_well_formed() {
            return Err(SlotError::InvalidInterval { slot_id: id });
        }

        Ok(slot)
    }

    pub fn is_well_formed(&self) -> bool {
        self.end > self.start
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Slot as served by the catalog. Older endpoints use Spanish field names and
/// the public hours endpoint omits the status of open slots.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotRecord {
    pub id: i64,
    #[serde(default, alias = "kinesiologo", alias = "practitioner_id")]
    pub practitioner: Option<i64>,
    #[serde(alias = "inicio")]
    pub start: DateTime<Utc>,
    #[serde(alias = "fin")]
    pub end: DateTime<Utc>,
    #[serde(default, alias = "estado")]
    pub status: Option<SlotStatus>,
}

impl SlotRecord {
    pub fn into_slot(self, practitioner_id: i64) -> Result<AvailabilitySlot, SlotError> {
        AvailabilitySlot::new(
            self.id,
            self.practitioner.unwrap_or(practitioner_id),
            self.start,
            self.end,
            self.status.unwrap_or_default(),
        )
    }
}

/// Local calendar date used as a bucket key, rendered as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for DateKey {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map(Self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    #[default]
    #[serde(alias = "todos")]
    All,
    #[serde(alias = "manana")]
    Morning,
    #[serde(alias = "tarde")]
    Afternoon,
}

impl DayPeriod {
    /// Hours from 22:00 onwards only show under `All`.
    pub fn contains_hour(&self, hour: u32) -> bool {
        match self {
            DayPeriod::All => true,
            DayPeriod::Morning => hour < 12,
            DayPeriod::Afternoon => (12..=21).contains(&hour),
        }
    }
}

// ==============================================================================
// PRACTITIONERS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practitioner {
    pub id: i64,
    #[serde(alias = "nombre")]
    pub first_name: String,
    #[serde(alias = "apellido")]
    pub last_name: String,
    #[serde(default, alias = "especialidad")]
    pub specialty: Option<String>,
    #[serde(default, alias = "foto_perfil")]
    pub photo_url: Option<String>,
    #[serde(default, alias = "precio_consulta", deserialize_with = "deserialize_price")]
    pub consultation_price: Option<u32>,
    #[serde(default, alias = "atiende_consulta")]
    pub offers_clinic: bool,
    #[serde(default, alias = "atiende_domicilio")]
    pub offers_home_visit: bool,
    #[serde(default, alias = "comuna")]
    pub commune: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

impl Practitioner {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn matches_specialty(&self, specialty: &str) -> bool {
        self.specialty
            .as_deref()
            .is_some_and(|own| own.trim().to_lowercase() == specialty.trim().to_lowercase())
    }
}

/// Prices come back either as JSON numbers or as decimal strings (`"25000.00"`).
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let amount = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    Ok(amount
        .filter(|amount| amount.is_finite() && *amount >= 0.0 && *amount <= u32::MAX as f64)
        .map(|amount| amount.round() as u32))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Specialty {
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PractitionerOrdering {
    Price,
    PriceDesc,
    Name,
}

impl PractitionerOrdering {
    fn as_query_value(&self) -> &'static str {
        match self {
            PractitionerOrdering::Price => "precio_consulta",
            PractitionerOrdering::PriceDesc => "-precio_consulta",
            PractitionerOrdering::Name => "apellido",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PractitionerFilters {
    pub specialty: Option<String>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    pub home_visit: Option<bool>,
    pub clinic: Option<bool>,
    pub commune: Option<String>,
    pub region: Option<String>,
    pub ordering: Option<PractitionerOrdering>,
}

impl PractitionerFilters {
    pub fn for_specialty(specialty: impl Into<String>) -> Self {
        Self {
            specialty: Some(specialty.into()),
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        let mut push = |key: &str, value: String| query.push((key.to_string(), value));

        if let Some(specialty) = self.specialty.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            push("especialidad", specialty.to_string());
        }
        if let Some(min_price) = self.min_price {
            push("precio_min", min_price.to_string());
        }
        if let Some(max_price) = self.max_price {
            push("precio_max", max_price.to_string());
        }
        if let Some(home_visit) = self.home_visit {
            push("atiende_domicilio", home_visit.to_string());
        }
        if let Some(clinic) = self.clinic {
            push("atiende_consulta", clinic.to_string());
        }
        if let Some(commune) = self.commune.as_deref().filter(|s| !s.trim().is_empty()) {
            push("comuna", commune.trim().to_string());
        }
        if let Some(region) = self.region.as_deref().filter(|s| !s.trim().is_empty()) {
            push("region", region.trim().to_string());
        }
        if let Some(ordering) = self.ordering {
            push("ordering", ordering.as_query_value().to_string());
        }

        query
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("Slot {slot_id} must end after it starts")]
    InvalidInterval { slot_id: i64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolverError {
    #[error("Slot {slot_id} is not available on {date_key}")]
    NotFound { date_key: DateKey, slot_id: i64 },

    #[error("{0} is in the past")]
    DayInPast(DateKey),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Practitioner catalog unavailable: {0}")]
    Network(String),

    #[error("Practitioner {0} not found")]
    PractitionerNotFound(i64),

    #[error("Unexpected catalog response: {0}")]
    InvalidResponse(String),
}
