use std::sync::Arc;

use axum::{routing::post, Router};

use shared_config::AppConfig;

use crate::handlers;

pub fn identity_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/national-id/validate", post(handlers::validate_national_id_handler))
        .route("/national-id/format", post(handlers::format_national_id_handler))
        .route("/email/validate", post(handlers::validate_email_handler))
        .route("/phone/validate", post(handlers::validate_phone_handler))
        .route("/birth-date/validate", post(handlers::validate_birth_date_handler))
        .route("/password/strength", post(handlers::password_strength_handler))
        .route("/file/validate", post(handlers::validate_file_handler))
        .with_state(state)
}
