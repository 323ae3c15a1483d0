mod common;

use assert_matches::assert_matches;
use chrono::Utc;
use tempfile::TempDir;

use availability_cell::SlotStatus;
use booking_cell::services::snapshot::{
    FileSnapshotStore, InMemorySnapshotStore, SessionSnapshotStore, SnapshotError,
};
use booking_cell::{BookingEvent, BookingSession, BookingSessionController, SearchMode, Step};

use common::{patient, practitioner, slot};

fn session_at_payment() -> BookingSession {
    let controller = BookingSessionController::new();
    [
        BookingEvent::ChooseMode(SearchMode::ByPractitioner),
        BookingEvent::SelectPractitioner {
            practitioner: practitioner(4, "Respiratoria"),
            view_profile: false,
        },
        BookingEvent::SelectSlot(slot(2, 4, SlotStatus::Available)),
        BookingEvent::SubmitPatient(patient()),
    ]
    .into_iter()
    .fold(BookingSession::new(Utc::now()), |session, event| {
        controller.transition(&session, event).unwrap()
    })
}

#[tokio::test]
async fn test_file_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(dir.path().join("snapshots"));
    let session = session_at_payment();

    store.save(&session).await.unwrap();
    let loaded = store.load(session.id()).await.unwrap();
    assert_eq!(loaded, Some(session.clone()));

    store.remove(session.id()).await.unwrap();
    assert_eq!(store.load(session.id()).await.unwrap(), None);

    // removing twice is not an error
    store.remove(session.id()).await.unwrap();
}

#[tokio::test]
async fn test_file_store_overwrites_previous_checkpoint() {
    let dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    let session = session_at_payment();

    store.save(&session).await.unwrap();
    let back = BookingSessionController::new()
        .transition(&session, BookingEvent::Back)
        .unwrap();
    store.save(&back).await.unwrap();

    let loaded = store.load(session.id()).await.unwrap().unwrap();
    assert_eq!(loaded.step(), Step::PatientIntake);
    assert!(loaded.patient().is_some());
}

#[tokio::test]
async fn test_file_store_rejects_inconsistent_snapshot() {
    let dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    let session = session_at_payment();

    let mut raw = serde_json::to_value(&session).unwrap();
    raw["practitioner"] = serde_json::Value::Null;
    tokio::fs::write(
        dir.path().join(format!("{}.json", session.id())),
        raw.to_string(),
    )
    .await
    .unwrap();

    assert_matches!(store.load(session.id()).await, Err(SnapshotError::Corrupt(_)));
}

#[tokio::test]
async fn test_file_store_rejects_garbage() {
    let dir = TempDir::new().unwrap();
    let store = FileSnapshotStore::new(dir.path());
    let session = session_at_payment();

    tokio::fs::write(dir.path().join(format!("{}.json", session.id())), "{ not json")
        .await
        .unwrap();

    assert_matches!(store.load(session.id()).await, Err(SnapshotError::Serialization(_)));
}

#[tokio::test]
async fn test_in_memory_store() {
    let store = InMemorySnapshotStore::new();
    let session = session_at_payment();

    assert_eq!(store.load(session.id()).await.unwrap(), None);

    store.save(&session).await.unwrap();
    assert_eq!(store.load(session.id()).await.unwrap(), Some(session.clone()));

    store.remove(session.id()).await.unwrap();
    assert_eq!(store.load(session.id()).await.unwrap(), None);
}
