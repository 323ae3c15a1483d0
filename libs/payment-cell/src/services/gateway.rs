use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use tracing::{debug, error, info};

use shared_config::AppConfig;
use shared_http::{ApiClient, ApiError};
use shared_models::Credential;

use crate::models::{PaymentError, PaymentInitiation, PaymentInitiationResponse};

const INITIATION_PATH: &str = "/pagos/citas/webpay/iniciar/";

const SLOT_TAKEN_MARKERS: [&str; 2] = ["ya no está disponible", "no longer available"];

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initiate(
        &self,
        initiation: &PaymentInitiation,
        credential: &Credential,
    ) -> Result<PaymentInitiationResponse, PaymentError>;
}

/// Turn a collaborator failure into the payment taxonomy. A slot taken by
/// another session shows up as 409/410, or as a 400 saying so.
pub fn classify_api_error(error: ApiError) -> PaymentError {
    match error {
        ApiError::NotConfigured | ApiError::Transport(_) => PaymentError::Network(error.to_string()),
        ApiError::Decode(message) => PaymentError::InvalidResponse(message),
        ApiError::Status { status, message } => {
            let lowered = message.to_lowercase();
            if status == StatusCode::CONFLICT
                || status == StatusCode::GONE
                || (status == StatusCode::BAD_REQUEST
                    && SLOT_TAKEN_MARKERS.iter().any(|marker| lowered.contains(marker)))
            {
                PaymentError::SlotUnavailable
            } else if status.is_server_error() {
                PaymentError::Network(format!("{}: {}", status, message))
            } else {
                PaymentError::Rejected(message)
            }
        }
    }
}

pub struct HttpPaymentGateway {
    client: ApiClient,
}

impl HttpPaymentGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: ApiClient::with_timeout(config.payment_base_url.clone(), config.request_timeout()),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn initiate(
        &self,
        initiation: &PaymentInitiation,
        credential: &Credential,
    ) -> Result<PaymentInitiationResponse, PaymentError> {
        debug!(
            "Initiating payment of {} for slot {}",
            initiation.amount, initiation.slot_id
        );

        let body = serde_json::to_value(initiation)
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))?;

        let response: PaymentInitiationResponse = self
            .client
            .request(Method::POST, INITIATION_PATH, credential, &[], Some(body))
            .await
            .map_err(|e| {
                let classified = classify_api_error(e);
                error!("Payment initiation failed for slot {}: {}", initiation.slot_id, classified);
                classified
            })?;

        if response.url.trim().is_empty() || response.token.trim().is_empty() {
            return Err(PaymentError::InvalidResponse(
                "missing redirect url or token".to_string(),
            ));
        }

        info!(
            "Payment initiated for slot {} (booking reference {:?})",
            initiation.slot_id, response.booking_reference
        );
        Ok(response)
    }
}
