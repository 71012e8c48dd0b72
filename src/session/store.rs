use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::Error;

/// The persisted credential pair. Opaque to everything except the
/// expiry decoder; the refresh flow belongs to the remote auth service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub access: String,
    pub refresh: String,
}

/// Where the credential pair survives process restarts.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credentials>, Error>;

    fn save(&self, credentials: &Credentials) -> Result<(), Error>;

    fn clear(&self) -> Result<(), Error>;
}

/// JSON file on disk.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<Option<Credentials>, Error> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)?;

        match serde_json::from_str(&raw) {
            Ok(credentials) => Ok(Some(credentials)),
            Err(err) => {
                // a corrupt credential file is the same as no credential
                tracing::warn!(?err, "discarding unreadable credential file");
                Ok(None)
            }
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&self.path, serde_json::to_string(credentials)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }

        Ok(())
    }
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Credentials>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credentials: Credentials) -> Self {
        Self {
            slot: Mutex::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<Option<Credentials>, Error> {
        match self.slot.lock() {
            Ok(slot) => Ok(slot.clone()),
            Err(_) => Ok(None),
        }
    }

    fn save(&self, credentials: &Credentials) -> Result<(), Error> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(credentials.clone());
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }

        Ok(())
    }
}
