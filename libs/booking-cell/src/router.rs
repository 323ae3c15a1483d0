use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::credential_middleware;

use crate::handlers;
use crate::services::flow::BookingFlowService;

pub fn booking_routes(flow: Arc<BookingFlowService>) -> Router {
    let session_routes = Router::new()
        .route("/sessions", post(handlers::create_session))
        .route(
            "/sessions/{session_id}",
            get(handlers::get_session).delete(handlers::abandon_session),
        )
        .route("/sessions/{session_id}/restore", get(handlers::restore_session))
        .route("/sessions/{session_id}/mode", post(handlers::choose_mode))
        .route("/sessions/{session_id}/specialties", get(handlers::list_specialties))
        .route("/sessions/{session_id}/specialty", post(handlers::select_specialty))
        .route("/sessions/{session_id}/practitioners", get(handlers::list_practitioners))
        .route("/sessions/{session_id}/practitioner", post(handlers::select_practitioner))
        .route("/sessions/{session_id}/continue", post(handlers::continue_from_profile))
        .route("/sessions/{session_id}/availability", get(handlers::get_availability))
        .route("/sessions/{session_id}/slot", post(handlers::select_slot))
        .route("/sessions/{session_id}/patient", post(handlers::submit_patient))
        .route("/sessions/{session_id}/back", post(handlers::go_back))
        .route("/sessions/{session_id}/confirm", post(handlers::confirm))
        .route("/sessions/{session_id}/confirm/form", post(handlers::confirm_with_form))
        .layer(middleware::from_fn(credential_middleware));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(session_routes)
        .with_state(flow)
}
