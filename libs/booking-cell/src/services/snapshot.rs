use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::BookingSession;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Snapshot storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Snapshot could not be encoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Snapshot is no longer consistent: {0}")]
    Corrupt(String),
}

/// Draft-recovery persistence. Callers save only at step checkpoints.
#[async_trait]
pub trait SessionSnapshotStore: Send + Sync {
    async fn save(&self, session: &BookingSession) -> Result<(), SnapshotError>;

    async fn load(&self, session_id: Uuid) -> Result<Option<BookingSession>, SnapshotError>;

    async fn remove(&self, session_id: Uuid) -> Result<(), SnapshotError>;
}

fn encode(session: &BookingSession) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(session)?)
}

fn decode(raw: &str) -> Result<BookingSession, SnapshotError> {
    let session: BookingSession = serde_json::from_str(raw)?;
    session
        .check_invariants()
        .map_err(|e| SnapshotError::Corrupt(e.to_string()))?;
    Ok(session)
}

#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<Uuid, String>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionSnapshotStore for InMemorySnapshotStore {
    async fn save(&self, session: &BookingSession) -> Result<(), SnapshotError> {
        let encoded = encode(session)?;
        self.snapshots.write().await.insert(session.id(), encoded);
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Option<BookingSession>, SnapshotError> {
        match self.snapshots.read().await.get(&session_id) {
            Some(raw) => decode(raw).map(Some),
            None => Ok(None),
        }
    }

    async fn remove(&self, session_id: Uuid) -> Result<(), SnapshotError> {
        self.snapshots.write().await.remove(&session_id);
        Ok(())
    }
}

/// One JSON file per session under `dir`.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, session_id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", session_id))
    }
}

#[async_trait]
impl SessionSnapshotStore for FileSnapshotStore {
    async fn save(&self, session: &BookingSession) -> Result<(), SnapshotError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(session.id());
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, encode(session)?).await?;
        tokio::fs::rename(&staging, &path).await?;

        debug!("Saved snapshot {}", path.display());
        Ok(())
    }

    async fn load(&self, session_id: Uuid) -> Result<Option<BookingSession>, SnapshotError> {
        match tokio::fs::read_to_string(self.path_for(session_id)).await {
            Ok(raw) => decode(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, session_id: Uuid) -> Result<(), SnapshotError> {
        match tokio::fs::remove_file(self.path_for(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("No snapshot to remove for session {}", session_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
