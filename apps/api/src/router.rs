use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::{booking_routes, BookingFlowService};
use identity_cell::identity_routes;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let flow = Arc::new(BookingFlowService::new(&config));
    flow.spawn_idle_sweeper();

    Router::new()
        .route("/", get(|| async { "Booking API is running!" }))
        .nest("/identity", identity_routes(config.clone()))
        .nest("/booking", booking_routes(flow))
}
