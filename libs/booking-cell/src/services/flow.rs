use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::services::resolver::select_slot;
use availability_cell::{
    AvailabilityOverview, AvailabilitySlot, CatalogError, DateKey, DayPeriod,
    HttpPractitionerCatalog, Practitioner, PractitionerCatalog, PractitionerFilters,
    ResolverError, SlotAvailabilityResolver, Specialty,
};
use payment_cell::{
    HttpPaymentGateway, PaymentError, PaymentGateway, PaymentHandoff, PaymentHandoffBuilder,
    PaymentInitiation,
};
use shared_config::AppConfig;
use shared_models::Credential;
use shared_utils::clock::{local_today, parse_timezone};

use crate::models::{BookingError, BookingEvent, BookingSession, PatientDraft, SearchMode, Step};
use crate::services::controller::BookingSessionController;
use crate::services::intake::PatientIntakeValidator;
use crate::services::registry::{SessionEntry, SessionRegistry};
use crate::services::snapshot::{FileSnapshotStore, InMemorySnapshotStore, SessionSnapshotStore};

impl From<CatalogError> for BookingError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::PractitionerNotFound(id) => {
                BookingError::NotFound(format!("Practitioner {} not found", id))
            }
            CatalogError::Network(message) | CatalogError::InvalidResponse(message) => {
                BookingError::Network(message)
            }
        }
    }
}

impl From<ResolverError> for BookingError {
    fn from(error: ResolverError) -> Self {
        match error {
            ResolverError::NotFound { .. } => BookingError::NotFound(error.to_string()),
            ResolverError::DayInPast(_) => BookingError::field("date_key", error.to_string()),
        }
    }
}

/// Drives booking sessions end to end: holds them in memory, talks to the
/// catalog and payment collaborators, and persists checkpoints.
pub struct BookingFlowService {
    catalog: Arc<dyn PractitionerCatalog>,
    handoff: PaymentHandoffBuilder,
    snapshots: Arc<dyn SessionSnapshotStore>,
    registry: SessionRegistry,
    controller: BookingSessionController,
    intake: PatientIntakeValidator,
    default_timezone: Tz,
    default_price: u32,
    idle_timeout: Duration,
}

impl BookingFlowService {
    pub fn new(config: &AppConfig) -> Self {
        let snapshots: Arc<dyn SessionSnapshotStore> = match &config.snapshot_dir {
            Some(dir) => {
                info!("Persisting booking snapshots under {}", dir.display());
                Arc::new(FileSnapshotStore::new(dir.clone()))
            }
            None => Arc::new(InMemorySnapshotStore::new()),
        };

        Self::with_collaborators(
            config,
            Arc::new(HttpPractitionerCatalog::new(config)),
            Arc::new(HttpPaymentGateway::new(config)),
            snapshots,
        )
    }

    pub fn with_collaborators(
        config: &AppConfig,
        catalog: Arc<dyn PractitionerCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        snapshots: Arc<dyn SessionSnapshotStore>,
    ) -> Self {
        Self {
            catalog,
            handoff: PaymentHandoffBuilder::new(gateway),
            snapshots,
            registry: SessionRegistry::new(config.session_idle_timeout()),
            controller: BookingSessionController::new(),
            intake: PatientIntakeValidator::new(config),
            default_timezone: config.default_timezone,
            default_price: config.default_consultation_price,
            idle_timeout: config.session_idle_timeout(),
        }
    }

    fn timezone(&self, requested: Option<&str>) -> Result<Tz, BookingError> {
        parse_timezone(requested, self.default_timezone).map_err(|e| BookingError::field("timezone", e))
    }

    async fn entry(&self, session_id: Uuid) -> Result<Arc<Mutex<SessionEntry>>, BookingError> {
        self.registry
            .get(session_id)
            .await
            .ok_or_else(|| BookingError::NotFound(format!("Booking session {} not found", session_id)))
    }

    /// Apply one event and persist the result when it lands on a checkpoint.
    async fn apply(&self, entry: &mut SessionEntry, event: BookingEvent) -> Result<BookingSession, BookingError> {
        if entry.payment_in_flight {
            return Err(BookingError::InvariantViolation(
                "payment is being initiated for this session".to_string(),
            ));
        }

        let next = self.controller.transition(&entry.session, event)?;
        entry.session = next;

        if entry.session.step().is_checkpoint() {
            if let Err(e) = self.snapshots.save(&entry.session).await {
                warn!("Could not save snapshot for session {}: {}", entry.session.id(), e);
            }
        }

        Ok(entry.session.clone())
    }

    /// Fill the slot cache if it is empty. The session lock is released
    /// while the catalog is called; the result is kept only if the session
    /// still points at the same practitioner.
    async fn ensure_slots(&self, handle: &Mutex<SessionEntry>, credential: &Credential) -> Result<(), BookingError> {
        let practitioner_id = {
            let entry = handle.lock().await;
            if entry.slots.is_some() {
                return Ok(());
            }
            entry
                .session
                .practitioner()
                .map(|p| p.id)
                .ok_or_else(|| BookingError::InvariantViolation("no practitioner selected".to_string()))?
        };

        let slots = self.catalog.list_slots(practitioner_id, credential).await?;

        let mut entry = handle.lock().await;
        if entry.slots.is_none() && entry.session.practitioner().map(|p| p.id) == Some(practitioner_id) {
            debug!("Cached {} slots for session {}", slots.len(), entry.session.id());
            entry.slots = Some(slots);
        }
        Ok(())
    }

    fn cached_slots(entry: &SessionEntry) -> Result<&[AvailabilitySlot], BookingError> {
        entry.slots.as_deref().ok_or_else(|| {
            BookingError::InvariantViolation("session changed while availability was being fetched".to_string())
        })
    }

    fn changed_during(operation: &str, session_id: Uuid) -> BookingError {
        warn!("Session {} changed while {}", session_id, operation);
        BookingError::InvariantViolation(format!("session changed while {}", operation))
    }

    fn checkout_amount(&self, practitioner: &Practitioner) -> u32 {
        practitioner
            .consultation_price
            .filter(|price| *price > 0)
            .unwrap_or(self.default_price)
    }

    // ==========================================================================
    // SESSION LIFECYCLE
    // ==========================================================================

    pub async fn start_session(&self, now: DateTime<Utc>) -> BookingSession {
        let session = BookingSession::new(now);
        info!("Started booking session {}", session.id());
        self.registry.insert(SessionEntry::new(session.clone())).await;
        session
    }

    pub async fn session(&self, session_id: Uuid) -> Result<BookingSession, BookingError> {
        let entry = self.entry(session_id).await?;
        let session = entry.lock().await.session.clone();
        Ok(session)
    }

    /// Drop sessions nobody touched within the idle timeout. Their last
    /// checkpoint stays in the snapshot store for `restore`.
    pub async fn evict_idle_sessions(&self) -> usize {
        self.registry.evict_idle().await
    }

    /// Sweep idle sessions periodically, at half the idle timeout.
    pub fn spawn_idle_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let flow = Arc::clone(self);
        let every = (self.idle_timeout / 2).max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let evicted = flow.evict_idle_sessions().await;
                if evicted > 0 {
                    info!("Swept {} idle booking sessions", evicted);
                }
            }
        })
    }

    /// Navigation away: drop the in-memory session and its snapshot. No hold
    /// is released anywhere since none is taken.
    pub async fn abandon(&self, session_id: Uuid) -> Result<(), BookingError> {
        let removed = self.registry.remove(session_id).await;

        if let Err(e) = self.snapshots.remove(session_id).await {
            warn!("Could not remove snapshot for session {}: {}", session_id, e);
        }

        if !removed {
            return Err(BookingError::NotFound(format!("Booking session {} not found", session_id)));
        }

        info!("Abandoned booking session {}", session_id);
        Ok(())
    }

    /// Bring a session back from its last checkpoint. The slot cache starts
    /// empty, so availability is fetched again.
    pub async fn restore(&self, session_id: Uuid) -> Result<BookingSession, BookingError> {
        let session = match self.snapshots.load(session_id).await {
            Ok(Some(session)) => session,
            Ok(None) => {
                return Err(BookingError::NotFound(format!("No snapshot for session {}", session_id)))
            }
            Err(e) => {
                warn!("Discarding unusable snapshot for session {}: {}", session_id, e);
                return Err(BookingError::NotFound(format!("No usable snapshot for session {}", session_id)));
            }
        };

        match self.registry.get(session_id).await {
            Some(handle) => {
                let mut entry = handle.lock().await;
                *entry = SessionEntry::new(session.clone());
            }
            None => {
                self.registry.insert(SessionEntry::new(session.clone())).await;
            }
        }

        info!("Restored session {} at {:?}", session_id, session.step());
        Ok(session)
    }

    // ==========================================================================
    // WIZARD STEPS
    // ==========================================================================

    pub async fn choose_mode(&self, session_id: Uuid, mode: SearchMode) -> Result<BookingSession, BookingError> {
        let handle = self.entry(session_id).await?;
        let mut entry = handle.lock().await;
        self.apply(&mut entry, BookingEvent::ChooseMode(mode)).await
    }

    pub async fn list_specialties(
        &self,
        session_id: Uuid,
        credential: &Credential,
    ) -> Result<Vec<Specialty>, BookingError> {
        self.entry(session_id).await?;
        Ok(self.catalog.list_specialties(credential).await?)
    }

    pub async fn select_specialty(&self, session_id: Uuid, specialty: String) -> Result<BookingSession, BookingError> {
        let handle = self.entry(session_id).await?;
        let mut entry = handle.lock().await;
        self.apply(&mut entry, BookingEvent::SelectSpecialty(specialty)).await
    }

    /// Practitioners to choose from; in by-specialty mode the selected
    /// specialty overrides whatever the caller filtered on.
    pub async fn list_practitioners(
        &self,
        session_id: Uuid,
        mut filters: PractitionerFilters,
        credential: &Credential,
    ) -> Result<Vec<Practitioner>, BookingError> {
        let specialty = self.session(session_id).await?.specialty().map(str::to_string);

        if let Some(specialty) = &specialty {
            filters.specialty = Some(specialty.clone());
        }

        let practitioners = self.catalog.list_practitioners(&filters, credential).await?;

        Ok(match specialty {
            Some(specialty) => practitioners
                .into_iter()
                .filter(|p| p.matches_specialty(&specialty))
                .collect(),
            None => practitioners,
        })
    }

    /// Select a practitioner and fetch their slots once for the rest of the
    /// session.
    pub async fn select_practitioner(
        &self,
        session_id: Uuid,
        practitioner_id: i64,
        view_profile: bool,
        credential: &Credential,
    ) -> Result<BookingSession, BookingError> {
        let handle = self.entry(session_id).await?;
        let before = handle.lock().await.session.clone();

        if before.step() != Step::Practitioner {
            return Err(BookingError::InvariantViolation(format!(
                "select_practitioner at {:?}: event not allowed at this step",
                before.step()
            )));
        }

        let practitioner = self.catalog.find_practitioner(practitioner_id, credential).await?;
        let slots = self.catalog.list_slots(practitioner_id, credential).await?;

        let mut entry = handle.lock().await;
        if entry.session != before {
            return Err(Self::changed_during("the practitioner was being loaded", session_id));
        }

        let session = self
            .apply(
                &mut entry,
                BookingEvent::SelectPractitioner {
                    practitioner,
                    view_profile,
                },
            )
            .await?;

        entry.slots = Some(slots);
        Ok(session)
    }

    pub async fn continue_from_profile(&self, session_id: Uuid) -> Result<BookingSession, BookingError> {
        let handle = self.entry(session_id).await?;
        let mut entry = handle.lock().await;
        self.apply(&mut entry, BookingEvent::ContinueFromProfile).await
    }

    pub async fn availability(
        &self,
        session_id: Uuid,
        period: DayPeriod,
        timezone: Option<&str>,
        now: DateTime<Utc>,
        credential: &Credential,
    ) -> Result<AvailabilityOverview, BookingError> {
        let resolver = SlotAvailabilityResolver::new(self.timezone(timezone)?);
        let handle = self.entry(session_id).await?;
        self.ensure_slots(&handle, credential).await?;

        let entry = handle.lock().await;
        Ok(resolver.overview(Self::cached_slots(&entry)?, period, now))
    }

    pub async fn select_slot(
        &self,
        session_id: Uuid,
        date_key: DateKey,
        slot_id: i64,
        timezone: Option<&str>,
        now: DateTime<Utc>,
        credential: &Credential,
    ) -> Result<BookingSession, BookingError> {
        let resolver = SlotAvailabilityResolver::new(self.timezone(timezone)?);
        let handle = self.entry(session_id).await?;

        let step = handle.lock().await.session.step();
        if step != Step::Slot {
            return Err(BookingError::InvariantViolation(format!(
                "select_slot at {:?}: event not allowed at this step",
                step
            )));
        }

        self.ensure_slots(&handle, credential).await?;

        let mut entry = handle.lock().await;
        let grouped = resolver.group_by_calendar_day(Self::cached_slots(&entry)?);
        let slot = select_slot(&grouped, date_key, slot_id, resolver.today(now))?;

        self.apply(&mut entry, BookingEvent::SelectSlot(slot)).await
    }

    pub async fn submit_patient(
        &self,
        session_id: Uuid,
        draft: &PatientDraft,
        timezone: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<BookingSession, BookingError> {
        let timezone = self.timezone(timezone)?;
        let handle = self.entry(session_id).await?;
        let mut entry = handle.lock().await;

        if entry.session.step() != Step::PatientIntake {
            return Err(BookingError::InvariantViolation(format!(
                "submit_patient at {:?}: event not allowed at this step",
                entry.session.step()
            )));
        }

        let today = local_today(&timezone, now);
        let patient = self.intake.validate(draft, today)?;

        self.apply(&mut entry, BookingEvent::SubmitPatient(patient)).await
    }

    pub async fn back(&self, session_id: Uuid) -> Result<BookingSession, BookingError> {
        let handle = self.entry(session_id).await?;
        let mut entry = handle.lock().await;

        let previous_practitioner = entry.session.practitioner().map(|p| p.id);
        let session = self.apply(&mut entry, BookingEvent::Back).await?;

        if session.practitioner().map(|p| p.id) != previous_practitioner {
            entry.slots = None;
        }

        Ok(session)
    }

    /// The terminal transition: initiate payment and hand the browser over to
    /// the gateway. A failed initiation leaves the session in `Payment`; a slot
    /// taken in the meantime sends it back to `Slot` with a fresh fetch pending.
    /// A confirmed session is discarded together with its snapshot.
    pub async fn confirm(
        &self,
        session_id: Uuid,
        credential: &Credential,
    ) -> Result<(BookingSession, PaymentHandoff), BookingError> {
        let handle = self.entry(session_id).await?;

        let (before, initiation) = {
            let mut entry = handle.lock().await;
            if entry.payment_in_flight {
                return Err(BookingError::InvariantViolation(
                    "payment is already being initiated for this session".to_string(),
                ));
            }

            let session = &entry.session;
            let (Step::Payment, Some(practitioner), Some(slot), Some(patient)) =
                (session.step(), session.practitioner(), session.slot(), session.patient())
            else {
                return Err(BookingError::InvariantViolation(format!(
                    "confirm at {:?}: event not allowed at this step",
                    session.step()
                )));
            };

            let initiation = PaymentInitiation {
                slot_id: slot.id,
                amount: self.checkout_amount(practitioner),
                payer: patient.payer_details(),
            };
            let before = session.clone();
            entry.payment_in_flight = true;
            (before, initiation)
        };

        let outcome = self.handoff.build_handoff(&initiation, credential).await;

        let mut entry = handle.lock().await;
        if !entry.payment_in_flight || entry.session != before {
            return Err(Self::changed_during("payment was being initiated", session_id));
        }
        entry.payment_in_flight = false;

        match outcome {
            Ok(handoff) => {
                let session = self
                    .apply(
                        &mut entry,
                        BookingEvent::Confirm {
                            booking_reference: handoff.booking_reference,
                        },
                    )
                    .await?;
                drop(entry);

                self.registry.remove(session_id).await;
                if let Err(e) = self.snapshots.remove(session_id).await {
                    warn!("Could not remove snapshot for session {}: {}", session_id, e);
                }

                info!(
                    "Session {} handed off to payment (booking reference {:?})",
                    session_id,
                    session.booking_reference()
                );
                Ok((session, handoff))
            }
            Err(PaymentError::SlotUnavailable) => {
                self.apply(&mut entry, BookingEvent::SlotLost).await?;
                entry.slots = None;
                Err(BookingError::NotFound(
                    "The selected slot is no longer available, please choose another one".to_string(),
                ))
            }
            Err(PaymentError::Rejected(message)) => Err(BookingError::field("payment", message)),
            Err(e) => Err(BookingError::Network(e.to_string())),
        }
    }
}
