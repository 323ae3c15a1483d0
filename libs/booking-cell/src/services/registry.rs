use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use availability_cell::AvailabilitySlot;

use crate::models::BookingSession;

/// A live session plus the slots fetched for its current practitioner.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub session: BookingSession,
    pub slots: Option<Vec<AvailabilitySlot>>,
    /// Set while a payment initiation is outstanding; no event may move the
    /// session until it clears.
    pub payment_in_flight: bool,
}

impl SessionEntry {
    pub fn new(session: BookingSession) -> Self {
        Self {
            session,
            slots: None,
            payment_in_flight: false,
        }
    }
}

struct Tracked {
    handle: Arc<Mutex<SessionEntry>>,
    last_touched: Instant,
}

/// Sessions never share state; each entry has its own lock so one session's
/// catalog or payment call does not hold up another. Entries untouched for
/// longer than `idle_timeout` are dropped on the next insert or sweep.
pub struct SessionRegistry {
    entries: RwLock<HashMap<Uuid, Tracked>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub async fn insert(&self, entry: SessionEntry) -> Arc<Mutex<SessionEntry>> {
        self.evict_idle().await;

        let id = entry.session.id();
        let handle = Arc::new(Mutex::new(entry));
        self.entries.write().await.insert(
            id,
            Tracked {
                handle: handle.clone(),
                last_touched: Instant::now(),
            },
        );
        handle
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, session_id: Uuid) -> Option<Arc<Mutex<SessionEntry>>> {
        let mut entries = self.entries.write().await;
        let slot = entries.get_mut(&session_id)?;
        slot.last_touched = Instant::now();
        Some(slot.handle.clone())
    }

    pub async fn remove(&self, session_id: Uuid) -> bool {
        self.entries.write().await.remove(&session_id).is_some()
    }

    /// Drops every session idle for at least `idle_timeout`. Returns how many
    /// were dropped.
    pub async fn evict_idle(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, slot| slot.last_touched.elapsed() < self.idle_timeout);

        let evicted = before - entries.len();
        if evicted > 0 {
            debug!("Evicted {} idle booking sessions", evicted);
        }
        evicted
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry() -> (Uuid, SessionEntry) {
        let session = BookingSession::new(Utc::now());
        (session.id(), SessionEntry::new(session))
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::new(Duration::from_secs(600));
        let (id, entry) = entry();

        registry.insert(entry).await;
        assert_eq!(registry.len().await, 1);

        let handle = registry.get(id).await.unwrap();
        assert!(handle.lock().await.slots.is_none());

        assert!(registry.remove(id).await);
        assert!(!registry.remove(id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_idle_sessions_are_evicted_on_insert() {
        let registry = SessionRegistry::new(Duration::ZERO);
        let (first, first_entry) = entry();
        let (second, second_entry) = entry();

        registry.insert(first_entry).await;
        registry.insert(second_entry).await;

        assert!(registry.get(first).await.is_none());
        assert_eq!(registry.evict_idle().await, 1);
        assert!(registry.get(second).await.is_none());
    }

    #[tokio::test]
    async fn test_recently_used_sessions_survive_sweep() {
        let registry = SessionRegistry::new(Duration::from_secs(600));
        let (first, first_entry) = entry();
        let (second, second_entry) = entry();

        registry.insert(first_entry).await;
        registry.insert(second_entry).await;

        assert_eq!(registry.evict_idle().await, 0);
        assert!(registry.get(first).await.is_some());
        assert!(registry.get(second).await.is_some());
    }

    #[tokio::test]
    async fn test_touching_a_session_resets_its_idle_clock() {
        let registry = SessionRegistry::new(Duration::from_millis(200));
        let (id, entry) = entry();
        registry.insert(entry).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(registry.get(id).await.is_some());
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(registry.evict_idle().await, 0);
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(registry.evict_idle().await, 1);
    }
}
