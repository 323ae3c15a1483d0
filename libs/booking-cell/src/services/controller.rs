use tracing::{debug, info, warn};

use crate::models::{BookingError, BookingEvent, BookingSession, SearchMode, Step};

/// The booking wizard's state machine. `transition` never mutates its input:
/// a rejected event leaves the caller holding the unchanged session.
#[derive(Debug, Default, Clone, Copy)]
pub struct BookingSessionController;

impl BookingSessionController {
    pub fn new() -> Self {
        Self
    }

    pub fn transition(
        &self,
        session: &BookingSession,
        event: BookingEvent,
    ) -> Result<BookingSession, BookingError> {
        let from = session.step;
        let event_name = event.name();
        debug!("Applying {} to session {} at {:?}", event_name, session.id, from);

        let mut next = session.clone();

        match (from, event) {
            (Step::Entry, BookingEvent::ChooseMode(mode)) => {
                next.step = match mode {
                    SearchMode::ByPractitioner => Step::Practitioner,
                    SearchMode::BySpecialty => Step::Specialty,
                    SearchMode::None => return Err(reject(session, event_name, "a search mode must be chosen")),
                };
                next.mode = mode;
            }

            (Step::Specialty, BookingEvent::SelectSpecialty(specialty)) => {
                let specialty = specialty.trim();
                if specialty.is_empty() {
                    return Err(BookingError::field("specialty", "Specialty is required"));
                }
                next.specialty = Some(specialty.to_string());
                next.step = Step::Practitioner;
            }

            (Step::Practitioner, BookingEvent::SelectPractitioner { practitioner, view_profile }) => {
                if let Some(specialty) = &session.specialty {
                    if !practitioner.matches_specialty(specialty) {
                        return Err(reject(session, event_name, "practitioner does not offer the selected specialty"));
                    }
                }

                next.practitioner = Some(practitioner);
                next.slot = None;
                next.patient = None;
                next.step = if view_profile {
                    Step::PractitionerDetail
                } else {
                    Step::Slot
                };
            }

            (Step::PractitionerDetail, BookingEvent::ContinueFromProfile) => {
                next.step = Step::Slot;
            }

            (Step::Slot, BookingEvent::SelectSlot(slot)) => {
                let owner = session.practitioner.as_ref().map(|p| p.id);
                if owner != Some(slot.practitioner_id) {
                    return Err(reject(session, event_name, "slot belongs to another practitioner"));
                }
                if !slot.is_well_formed() {
                    return Err(reject(session, event_name, "slot ends before it starts"));
                }
                if !slot.is_available() {
                    return Err(reject(session, event_name, "slot is not available"));
                }

                next.slot = Some(slot);
                next.patient = None;
                next.step = Step::PatientIntake;
            }

            (Step::PatientIntake, BookingEvent::SubmitPatient(patient)) => {
                next.patient = Some(patient);
                next.step = Step::Payment;
            }

            (Step::Payment, BookingEvent::Confirm { booking_reference }) => {
                next.booking_reference = booking_reference;
                next.step = Step::Confirmation;
            }

            (Step::Payment, BookingEvent::SlotLost) => {
                warn!("Slot lost for session {}, returning to slot selection", session.id);
                next.slot = None;
                next.patient = None;
                next.step = Step::Slot;
            }

            (_, BookingEvent::Back) => apply_back(session, &mut next)?,

            _ => return Err(reject(session, event_name, "event not allowed at this step")),
        }

        next.check_invariants().inspect_err(|e| {
            warn!("Transition {} on session {} broke an invariant: {}", event_name, session.id, e);
        })?;

        info!(
            "Session {} moved {:?} -> {:?} on {}",
            session.id, from, next.step, event_name
        );
        Ok(next)
    }

    /// Where `back` would lead from the session's current step, if anywhere.
    pub fn back_target(&self, session: &BookingSession) -> Option<Step> {
        match session.step {
            Step::Entry | Step::Confirmation => None,
            Step::Specialty => Some(Step::Entry),
            Step::Practitioner => match session.mode {
                SearchMode::BySpecialty => Some(Step::Specialty),
                _ => Some(Step::Entry),
            },
            Step::PractitionerDetail | Step::Slot => Some(Step::Practitioner),
            Step::PatientIntake => Some(Step::Slot),
            Step::Payment => Some(Step::PatientIntake),
        }
    }
}

fn reject(session: &BookingSession, event: &str, reason: &str) -> BookingError {
    warn!(
        "Rejected {} for session {} at {:?}: {}",
        event, session.id, session.step, reason
    );
    BookingError::InvariantViolation(format!("{} at {:?}: {}", event, session.step, reason))
}

fn apply_back(session: &BookingSession, next: &mut BookingSession) -> Result<(), BookingError> {
    match session.step {
        Step::Entry | Step::Confirmation => {
            return Err(reject(session, "back", "no previous step"));
        }
        Step::Specialty => {
            next.mode = SearchMode::None;
            next.specialty = None;
            next.step = Step::Entry;
        }
        Step::Practitioner => {
            next.practitioner = None;
            next.slot = None;
            next.patient = None;
            if session.mode == SearchMode::BySpecialty {
                next.specialty = None;
                next.step = Step::Specialty;
            } else {
                next.mode = SearchMode::None;
                next.step = Step::Entry;
            }
        }
        Step::PractitionerDetail => {
            next.practitioner = None;
            next.slot = None;
            next.patient = None;
            next.step = Step::Practitioner;
        }
        Step::Slot => {
            next.slot = None;
            next.patient = None;
            next.step = Step::Practitioner;
        }
        Step::PatientIntake => {
            next.slot = None;
            next.patient = None;
            next.step = Step::Slot;
        }
        // the patient stays attached so it can be edited and resubmitted
        Step::Payment => {
            next.step = Step::PatientIntake;
        }
    }
    Ok(())
}

/// Steps shown in the progress indicator. The profile view shares the
/// practitioner position.
pub fn visible_steps(mode: SearchMode) -> Vec<Step> {
    let mut steps = Vec::with_capacity(6);
    if mode == SearchMode::BySpecialty {
        steps.push(Step::Specialty);
    }
    steps.extend([
        Step::Practitioner,
        Step::Slot,
        Step::PatientIntake,
        Step::Payment,
        Step::Confirmation,
    ]);
    steps
}

/// Zero-based position of `step` in `visible_steps(mode)`.
pub fn progress_position(step: Step, mode: SearchMode) -> Option<usize> {
    let shown = match step {
        Step::PractitionerDetail => Step::Practitioner,
        other => other,
    };
    visible_steps(mode).iter().position(|candidate| *candidate == shown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_steps_depend_on_mode() {
        assert_eq!(visible_steps(SearchMode::BySpecialty).first(), Some(&Step::Specialty));
        assert_eq!(visible_steps(SearchMode::ByPractitioner).first(), Some(&Step::Practitioner));
        assert_eq!(visible_steps(SearchMode::ByPractitioner).len(), 5);
    }

    #[test]
    fn test_progress_position() {
        assert_eq!(progress_position(Step::PractitionerDetail, SearchMode::BySpecialty), Some(1));
        assert_eq!(progress_position(Step::Payment, SearchMode::ByPractitioner), Some(3));
        assert_eq!(progress_position(Step::Entry, SearchMode::None), None);
    }

    #[test]
    fn test_back_target_from_practitioner_depends_on_mode() {
        let controller = BookingSessionController::new();
        let session = BookingSession::new(chrono::Utc::now());
        let by_specialty = controller
            .transition(&session, BookingEvent::ChooseMode(SearchMode::BySpecialty))
            .and_then(|s| controller.transition(&s, BookingEvent::SelectSpecialty("Respiratoria".into())))
            .unwrap();
        let by_practitioner = controller
            .transition(&session, BookingEvent::ChooseMode(SearchMode::ByPractitioner))
            .unwrap();

        assert_eq!(controller.back_target(&by_specialty), Some(Step::Specialty));
        assert_eq!(controller.back_target(&by_practitioner), Some(Step::Entry));
        assert_eq!(controller.back_target(&session), None);
    }
}
