use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use study_core::model::StudySessionId;

/// Durable record of a suspension, written when the tab goes away so the
/// grace deadline survives a full page reload, not just a tab switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendMarker {
    pub session_id: StudySessionId,
    pub suspended_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SuspendStoreError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

/// Small durable slot for the suspend marker.
pub trait SuspendStore: Send + Sync {
    /// Persist the marker, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SuspendStoreError` if the marker cannot be written.
    fn save(&self, marker: &SuspendMarker) -> Result<(), SuspendStoreError>;

    /// The stored marker, if any.
    ///
    /// # Errors
    ///
    /// Returns `SuspendStoreError` if the slot cannot be read.
    fn load(&self) -> Result<Option<SuspendMarker>, SuspendStoreError>;

    /// Remove the marker. Clearing an empty slot is fine.
    ///
    /// # Errors
    ///
    /// Returns `SuspendStoreError` if the removal fails.
    fn clear(&self) -> Result<(), SuspendStoreError>;
}

/// Process-local store for tests and prototyping.
#[derive(Default)]
pub struct InMemorySuspendStore {
    slot: Mutex<Option<SuspendMarker>>,
}

impl InMemorySuspendStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SuspendStore for InMemorySuspendStore {
    fn save(&self, marker: &SuspendMarker) -> Result<(), SuspendStoreError> {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = Some(*marker);
        }
        Ok(())
    }

    fn load(&self) -> Result<Option<SuspendMarker>, SuspendStoreError> {
        Ok(self.slot.lock().map(|guard| *guard).unwrap_or(None))
    }

    fn clear(&self) -> Result<(), SuspendStoreError> {
        if let Ok(mut guard) = self.slot.lock() {
            *guard = None;
        }
        Ok(())
    }
}

/// Marker persisted as a small JSON file next to the app's other state.
pub struct JsonFileSuspendStore {
    path: PathBuf,
}

impl JsonFileSuspendStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SuspendStore for JsonFileSuspendStore {
    fn save(&self, marker: &SuspendMarker) -> Result<(), SuspendStoreError> {
        let json = serde_json::to_string(marker)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<SuspendMarker>, SuspendStoreError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn clear(&self) -> Result<(), SuspendStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
