use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{json, Value};

use shared_config::AppConfig;

pub struct TestConfig {
    pub catalog_base_url: String,
    pub payment_base_url: String,
    pub timezone: Tz,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: "http://localhost:8000/api".to_string(),
            payment_base_url: "http://localhost:8000/api".to_string(),
            timezone: Tz::America__Santiago,
        }
    }
}

impl TestConfig {
    /// Point both collaborators at the same mock server.
    pub fn with_server(uri: &str) -> Self {
        Self {
            catalog_base_url: uri.to_string(),
            payment_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            catalog_base_url: self.catalog_base_url.clone(),
            payment_base_url: self.payment_base_url.clone(),
            default_timezone: self.timezone,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct MockCatalogResponses;

impl MockCatalogResponses {
    pub fn practitioner(id: i64, first_name: &str, last_name: &str, specialty: &str) -> Value {
        json!({
            "id": id,
            "nombre": first_name,
            "apellido": last_name,
            "especialidad": specialty,
            "foto_perfil": null,
            "precio_consulta": 30000,
            "atiende_consulta": true,
            "atiende_domicilio": false,
            "comuna": "Providencia",
            "region": "Metropolitana"
        })
    }

    /// Public hours endpoint shape: no status field, so the slot is open.
    pub fn slot(id: i64, start: DateTime<Utc>, end: DateTime<Utc>) -> Value {
        json!({
            "id": id,
            "inicio": start.to_rfc3339(),
            "fin": end.to_rfc3339()
        })
    }

    pub fn slot_with_status(id: i64, start: DateTime<Utc>, end: DateTime<Utc>, status: &str) -> Value {
        json!({
            "id": id,
            "inicio": start.to_rfc3339(),
            "fin": end.to_rfc3339(),
            "estado": status
        })
    }
}

pub struct MockPaymentResponses;

impl MockPaymentResponses {
    pub fn initiation(url: &str, token: &str, booking_reference: i64) -> Value {
        json!({
            "url": url,
            "token": token,
            "cita_id": booking_reference
        })
    }

    pub fn slot_taken() -> Value {
        json!({ "error": "El horario ya no está disponible." })
    }
}
