use std::sync::Arc;

use tracing::{debug, warn};

use shared_models::Credential;

use crate::models::{HandoffForm, PaymentError, PaymentHandoff, PaymentInitiation};
use crate::services::gateway::PaymentGateway;

pub struct PaymentHandoffBuilder {
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentHandoffBuilder {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { gateway }
    }

    /// Ask the gateway for a one-time token and wrap it in the form the
    /// browser has to submit. Nothing is retained on failure.
    pub async fn build_handoff(
        &self,
        initiation: &PaymentInitiation,
        credential: &Credential,
    ) -> Result<PaymentHandoff, PaymentError> {
        if initiation.amount == 0 {
            warn!("Refusing to initiate a zero amount payment for slot {}", initiation.slot_id);
            return Err(PaymentError::Rejected("amount must be positive".to_string()));
        }

        let response = self.gateway.initiate(initiation, credential).await?;
        debug!("Building handoff form for {}", response.url);

        Ok(PaymentHandoff {
            form: HandoffForm::token_post(response.url.clone(), response.token.clone()),
            action_url: response.url,
            token: response.token,
            booking_reference: response.booking_reference,
        })
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// A page that submits the handoff form as soon as it loads, with a manual
/// button for browsers without scripting.
pub fn render_auto_submit_html(form: &HandoffForm) -> String {
    let inputs: String = form
        .fields
        .iter()
        .map(|(name, value)| {
            format!(
                "    <input type=\"hidden\" name=\"{}\" value=\"{}\"/>\n",
                escape_html(name),
                escape_html(value)
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"><title>Redirecting to payment</title></head>\n\
         <body onload=\"document.forms[0].submit()\">\n\
         <form method=\"{}\" action=\"{}\">\n\
         {}    <noscript><button type=\"submit\">Continue to payment</button></noscript>\n\
         </form>\n\
         </body>\n\
         </html>\n",
        escape_html(&form.method),
        escape_html(&form.action_url),
        inputs
    )
}
