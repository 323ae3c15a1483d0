use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Html,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use availability_cell::{AvailabilityOverview, Practitioner, PractitionerFilters, Specialty};
use payment_cell::services::handoff::render_auto_submit_html;
use payment_cell::PaymentHandoff;
use shared_models::{AppError, Credential};

use crate::models::{
    AvailabilityQuery, BookingSession, ChooseModeRequest, SelectPractitionerRequest,
    SelectSlotRequest, SelectSpecialtyRequest, Step, SubmitPatientRequest,
};
use crate::services::controller::{progress_position, visible_steps, BookingSessionController};
use crate::services::flow::BookingFlowService;

// ==============================================================================
// RESPONSE SHAPES
// ==============================================================================

#[derive(Debug, Serialize)]
pub struct StepView {
    pub step: Step,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub session: BookingSession,
    pub step_label: &'static str,
    pub visible_steps: Vec<StepView>,
    pub progress: Option<usize>,
    pub back_target: Option<Step>,
}

impl From<BookingSession> for SessionView {
    fn from(session: BookingSession) -> Self {
        let mode = session.mode();
        let step = session.step();

        Self {
            step_label: step.label(),
            visible_steps: visible_steps(mode)
                .into_iter()
                .map(|step| StepView {
                    step,
                    label: step.label(),
                })
                .collect(),
            progress: progress_position(step, mode),
            back_target: BookingSessionController::new().back_target(&session),
            session,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmationView {
    pub session: SessionView,
    pub handoff: PaymentHandoff,
}

// ==============================================================================
// SESSION LIFECYCLE
// ==============================================================================

#[axum::debug_handler]
pub async fn create_session(
    State(flow): State<Arc<BookingFlowService>>,
) -> (StatusCode, Json<SessionView>) {
    let session = flow.start_session(Utc::now()).await;
    (StatusCode::CREATED, Json(session.into()))
}

#[axum::debug_handler]
pub async fn get_session(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow.session(session_id).await?;
    Ok(Json(session.into()))
}

#[axum::debug_handler]
pub async fn abandon_session(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    flow.abandon(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
pub async fn restore_session(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow.restore(session_id).await?;
    Ok(Json(session.into()))
}

// ==============================================================================
// WIZARD STEPS
// ==============================================================================

#[axum::debug_handler]
pub async fn choose_mode(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ChooseModeRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow.choose_mode(session_id, request.mode).await?;
    Ok(Json(session.into()))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(flow): State<Arc<BookingFlowService>>,
    Extension(credential): Extension<Credential>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Vec<Specialty>>, AppError> {
    let specialties = flow.list_specialties(session_id, &credential).await?;
    Ok(Json(specialties))
}

#[axum::debug_handler]
pub async fn select_specialty(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectSpecialtyRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow.select_specialty(session_id, request.specialty).await?;
    Ok(Json(session.into()))
}

#[axum::debug_handler]
pub async fn list_practitioners(
    State(flow): State<Arc<BookingFlowService>>,
    Extension(credential): Extension<Credential>,
    Path(session_id): Path<Uuid>,
    Query(filters): Query<PractitionerFilters>,
) -> Result<Json<Vec<Practitioner>>, AppError> {
    let practitioners = flow
        .list_practitioners(session_id, filters, &credential)
        .await?;
    Ok(Json(practitioners))
}

#[axum::debug_handler]
pub async fn select_practitioner(
    State(flow): State<Arc<BookingFlowService>>,
    Extension(credential): Extension<Credential>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectPractitionerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow
        .select_practitioner(
            session_id,
            request.practitioner_id,
            request.view_profile,
            &credential,
        )
        .await?;
    Ok(Json(session.into()))
}

#[axum::debug_handler]
pub async fn continue_from_profile(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow.continue_from_profile(session_id).await?;
    Ok(Json(session.into()))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(flow): State<Arc<BookingFlowService>>,
    Extension(credential): Extension<Credential>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityOverview>, AppError> {
    let overview = flow
        .availability(
            session_id,
            query.period,
            query.timezone.as_deref(),
            Utc::now(),
            &credential,
        )
        .await?;
    Ok(Json(overview))
}

#[axum::debug_handler]
pub async fn select_slot(
    State(flow): State<Arc<BookingFlowService>>,
    Extension(credential): Extension<Credential>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SelectSlotRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow
        .select_slot(
            session_id,
            request.date_key,
            request.slot_id,
            request.timezone.as_deref(),
            Utc::now(),
            &credential,
        )
        .await?;
    Ok(Json(session.into()))
}

#[axum::debug_handler]
pub async fn submit_patient(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<SubmitPatientRequest>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow
        .submit_patient(
            session_id,
            &request.patient,
            request.timezone.as_deref(),
            Utc::now(),
        )
        .await?;
    Ok(Json(session.into()))
}

#[axum::debug_handler]
pub async fn go_back(
    State(flow): State<Arc<BookingFlowService>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = flow.back(session_id).await?;
    Ok(Json(session.into()))
}

// ==============================================================================
// PAYMENT HANDOFF
// ==============================================================================

#[axum::debug_handler]
pub async fn confirm(
    State(flow): State<Arc<BookingFlowService>>,
    Extension(credential): Extension<Credential>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ConfirmationView>, AppError> {
    let (session, handoff) = flow.confirm(session_id, &credential).await?;
    Ok(Json(ConfirmationView {
        session: session.into(),
        handoff,
    }))
}

/// Same as `confirm`, answered with a page that posts the token to the
/// gateway on load.
#[axum::debug_handler]
pub async fn confirm_with_form(
    State(flow): State<Arc<BookingFlowService>>,
    Extension(credential): Extension<Credential>,
    Path(session_id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let (_, handoff) = flow.confirm(session_id, &credential).await?;
    Ok(Html(render_auto_submit_html(&handoff.form)))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "booking" }))
}
