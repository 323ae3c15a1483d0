use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hidden form field the gateway expects the one-time token in.
pub const TOKEN_FIELD: &str = "token_ws";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerDetails {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    #[serde(rename = "rut")]
    pub national_id: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    #[serde(rename = "agenda_id")]
    pub slot_id: i64,
    #[serde(rename = "monto")]
    pub amount: u32,
    #[serde(flatten)]
    pub payer: PayerDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiationResponse {
    pub url: String,
    pub token: String,
    #[serde(default, alias = "cita_id")]
    pub booking_reference: Option<i64>,
}

/// A browser-level form POST: the gateway opens its own session from a
/// traditional form submission, never from an in-page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffForm {
    pub action_url: String,
    pub method: String,
    pub fields: Vec<(String, String)>,
}

impl HandoffForm {
    pub fn token_post(action_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            action_url: action_url.into(),
            method: "POST".to_string(),
            fields: vec![(TOKEN_FIELD.to_string(), token.into())],
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == TOKEN_FIELD)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentHandoff {
    pub action_url: String,
    pub token: String,
    pub form: HandoffForm,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_reference: Option<i64>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    #[error("Payment service unavailable: {0}")]
    Network(String),

    #[error("The selected slot is no longer available")]
    SlotUnavailable,

    #[error("Payment rejected: {0}")]
    Rejected(String),

    #[error("Unexpected payment response: {0}")]
    InvalidResponse(String),
}

impl PaymentError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::Network(_))
    }
}
