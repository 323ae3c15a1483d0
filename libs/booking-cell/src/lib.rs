pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{BookingError, BookingEvent, BookingSession, PatientDraft, PatientRecord, SearchMode, Step};
pub use router::booking_routes;
pub use services::controller::{visible_steps, BookingSessionController};
pub use services::flow::BookingFlowService;
