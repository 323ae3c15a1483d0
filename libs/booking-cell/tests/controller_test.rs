mod common;

use assert_matches::assert_matches;
use chrono::Utc;

use availability_cell::SlotStatus;
use booking_cell::{BookingError, BookingEvent, BookingSession, BookingSessionController, SearchMode, Step};

use common::{patient, practitioner, slot};

fn controller() -> BookingSessionController {
    BookingSessionController::new()
}

fn apply(session: &BookingSession, events: Vec<BookingEvent>) -> BookingSession {
    events.into_iter().fold(session.clone(), |current, event| {
        controller().transition(&current, event).unwrap()
    })
}

fn at_slot_by_specialty() -> BookingSession {
    apply(
        &BookingSession::new(Utc::now()),
        vec![
            BookingEvent::ChooseMode(SearchMode::BySpecialty),
            BookingEvent::SelectSpecialty("Respiratoria".to_string()),
            BookingEvent::SelectPractitioner {
                practitioner: practitioner(4, "Respiratoria"),
                view_profile: true,
            },
            BookingEvent::ContinueFromProfile,
        ],
    )
}

fn at_payment() -> BookingSession {
    apply(
        &at_slot_by_specialty(),
        vec![
            BookingEvent::SelectSlot(slot(1, 4, SlotStatus::Available)),
            BookingEvent::SubmitPatient(patient()),
        ],
    )
}

#[test]
fn test_forward_path_by_specialty() {
    let session = at_payment();

    assert_eq!(session.step(), Step::Payment);
    assert_eq!(session.mode(), SearchMode::BySpecialty);
    assert_eq!(session.specialty(), Some("Respiratoria"));
    assert_eq!(session.practitioner().map(|p| p.id), Some(4));
    assert!(session.slot().unwrap().is_available());
    assert_eq!(session.patient().unwrap().national_id(), "123456785");

    let confirmed = controller()
        .transition(&session, BookingEvent::Confirm { booking_reference: Some(55) })
        .unwrap();
    assert_eq!(confirmed.step(), Step::Confirmation);
    assert_eq!(confirmed.booking_reference(), Some(55));
}

#[test]
fn test_practitioner_can_skip_profile() {
    let session = apply(
        &BookingSession::new(Utc::now()),
        vec![
            BookingEvent::ChooseMode(SearchMode::ByPractitioner),
            BookingEvent::SelectPractitioner {
                practitioner: practitioner(9, "Deportiva"),
                view_profile: false,
            },
        ],
    );

    assert_eq!(session.step(), Step::Slot);
    assert_eq!(session.specialty(), None);
}

#[test]
fn test_event_out_of_order_is_rejected_without_change() {
    let session = apply(
        &BookingSession::new(Utc::now()),
        vec![BookingEvent::ChooseMode(SearchMode::ByPractitioner)],
    );
    let before = session.clone();

    let result = controller().transition(&session, BookingEvent::SelectSlot(slot(1, 4, SlotStatus::Available)));

    assert_matches!(result, Err(BookingError::InvariantViolation(_)));
    assert_eq!(session, before);
}

#[test]
fn test_unavailable_slot_is_rejected() {
    let session = at_slot_by_specialty();

    for status in [SlotStatus::Reserved, SlotStatus::Unavailable, SlotStatus::Expired] {
        let result = controller().transition(&session, BookingEvent::SelectSlot(slot(1, 4, status)));
        assert_matches!(result, Err(BookingError::InvariantViolation(_)));
    }
}

#[test]
fn test_slot_of_another_practitioner_is_rejected() {
    let result = controller().transition(
        &at_slot_by_specialty(),
        BookingEvent::SelectSlot(slot(1, 5, SlotStatus::Available)),
    );
    assert_matches!(result, Err(BookingError::InvariantViolation(_)));
}

#[test]
fn test_practitioner_outside_selected_specialty_is_rejected() {
    let session = apply(
        &BookingSession::new(Utc::now()),
        vec![
            BookingEvent::ChooseMode(SearchMode::BySpecialty),
            BookingEvent::SelectSpecialty("respiratoria".to_string()),
        ],
    );

    let result = controller().transition(
        &session,
        BookingEvent::SelectPractitioner {
            practitioner: practitioner(2, "Deportiva"),
            view_profile: false,
        },
    );
    assert_matches!(result, Err(BookingError::InvariantViolation(_)));

    // specialty comparison ignores case
    let accepted = controller().transition(
        &session,
        BookingEvent::SelectPractitioner {
            practitioner: practitioner(3, "Respiratoria"),
            view_profile: false,
        },
    );
    assert!(accepted.is_ok());
}

#[test]
fn test_blank_specialty_is_a_validation_error() {
    let session = apply(
        &BookingSession::new(Utc::now()),
        vec![BookingEvent::ChooseMode(SearchMode::BySpecialty)],
    );

    let result = controller().transition(&session, BookingEvent::SelectSpecialty("  ".to_string()));
    assert_matches!(result, Err(BookingError::Validation(ref fields)) if fields[0].field == "specialty");
}

#[test]
fn test_back_from_slot_clears_slot_only() {
    let at_intake = controller()
        .transition(&at_slot_by_specialty(), BookingEvent::SelectSlot(slot(1, 4, SlotStatus::Available)))
        .unwrap();
    let at_slot = controller().transition(&at_intake, BookingEvent::Back).unwrap();
    assert_eq!(at_slot.step(), Step::Slot);
    assert!(at_slot.slot().is_none());

    let at_practitioner = controller().transition(&at_slot, BookingEvent::Back).unwrap();
    assert_eq!(at_practitioner.step(), Step::Practitioner);
    assert!(at_practitioner.slot().is_none());
    assert!(at_practitioner.practitioner().is_some());
}

#[test]
fn test_back_from_practitioner_depends_on_mode() {
    let at_slot = at_slot_by_specialty();
    let at_practitioner = controller().transition(&at_slot, BookingEvent::Back).unwrap();
    let at_specialty = controller().transition(&at_practitioner, BookingEvent::Back).unwrap();

    assert_eq!(at_specialty.step(), Step::Specialty);
    assert_eq!(at_specialty.mode(), SearchMode::BySpecialty);
    assert!(at_specialty.practitioner().is_none());
    assert!(at_specialty.specialty().is_none());

    let by_practitioner = apply(
        &BookingSession::new(Utc::now()),
        vec![BookingEvent::ChooseMode(SearchMode::ByPractitioner)],
    );
    let at_entry = controller().transition(&by_practitioner, BookingEvent::Back).unwrap();
    assert_eq!(at_entry.step(), Step::Entry);
    assert_eq!(at_entry.mode(), SearchMode::None);
}

#[test]
fn test_back_from_profile_drops_practitioner() {
    let at_profile = apply(
        &BookingSession::new(Utc::now()),
        vec![
            BookingEvent::ChooseMode(SearchMode::ByPractitioner),
            BookingEvent::SelectPractitioner {
                practitioner: practitioner(4, "Respiratoria"),
                view_profile: true,
            },
        ],
    );

    let back = controller().transition(&at_profile, BookingEvent::Back).unwrap();
    assert_eq!(back.step(), Step::Practitioner);
    assert!(back.practitioner().is_none());
}

#[test]
fn test_back_from_payment_keeps_patient_for_editing() {
    let at_intake = controller().transition(&at_payment(), BookingEvent::Back).unwrap();

    assert_eq!(at_intake.step(), Step::PatientIntake);
    assert!(at_intake.patient().is_some());
    assert!(at_intake.slot().is_some());

    let resubmitted = controller()
        .transition(&at_intake, BookingEvent::SubmitPatient(patient()))
        .unwrap();
    assert_eq!(resubmitted.step(), Step::Payment);
}

#[test]
fn test_back_from_intake_cascades() {
    let at_intake = controller().transition(&at_payment(), BookingEvent::Back).unwrap();
    let at_slot = controller().transition(&at_intake, BookingEvent::Back).unwrap();

    assert_eq!(at_slot.step(), Step::Slot);
    assert!(at_slot.slot().is_none());
    assert!(at_slot.patient().is_none());
}

#[test]
fn test_back_has_no_target_at_ends() {
    let entry = BookingSession::new(Utc::now());
    assert_matches!(
        controller().transition(&entry, BookingEvent::Back),
        Err(BookingError::InvariantViolation(_))
    );

    let confirmed = controller()
        .transition(&at_payment(), BookingEvent::Confirm { booking_reference: None })
        .unwrap();
    assert_matches!(
        controller().transition(&confirmed, BookingEvent::Back),
        Err(BookingError::InvariantViolation(_))
    );
}

#[test]
fn test_slot_lost_returns_to_slot_selection() {
    let session = controller().transition(&at_payment(), BookingEvent::SlotLost).unwrap();

    assert_eq!(session.step(), Step::Slot);
    assert!(session.slot().is_none());
    assert!(session.patient().is_none());
    assert!(session.practitioner().is_some());
}

#[test]
fn test_confirm_only_from_payment() {
    let result = controller().transition(&at_slot_by_specialty(), BookingEvent::Confirm { booking_reference: None });
    assert_matches!(result, Err(BookingError::InvariantViolation(_)));
}

#[test]
fn test_choose_none_mode_is_rejected() {
    let result = controller().transition(&BookingSession::new(Utc::now()), BookingEvent::ChooseMode(SearchMode::None));
    assert_matches!(result, Err(BookingError::InvariantViolation(_)));
}

#[test]
fn test_every_reachable_session_keeps_invariants() {
    let sessions = [
        BookingSession::new(Utc::now()),
        at_slot_by_specialty(),
        at_payment(),
        controller().transition(&at_payment(), BookingEvent::Back).unwrap(),
        controller().transition(&at_payment(), BookingEvent::SlotLost).unwrap(),
    ];

    for session in &sessions {
        assert!(session.check_invariants().is_ok(), "{:?}", session.step());
    }
}
