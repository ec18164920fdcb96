//! Per-upload sessions
//!
//! Each upload gets its own [`Session`] and a private temp directory holding
//! the workbook file. Dropping the slot removes the directory, so a failed
//! upload, a deleted session or an expired one leaves nothing behind.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::core::Session;
use crate::error::RegistryResult;
use crate::excel::{ExcelImporter, XlsxFileSink};

const WORKBOOK_FILE: &str = "registro.xlsx";

pub struct SessionSlot {
    pub session: Session,
    workbook_path: PathBuf,
    last_access: Instant,
    _dir: TempDir,
}

impl SessionSlot {
    /// Store the uploaded bytes and open a session on them
    pub fn from_upload(bytes: &[u8], config: &RegistryConfig) -> RegistryResult<Self> {
        let dir = TempDir::new()?;
        let workbook_path = dir.path().join(WORKBOOK_FILE);
        std::fs::write(&workbook_path, bytes)?;

        let tables = ExcelImporter::new(&workbook_path).import()?;
        let session = Session::open(tables, config)?;

        Ok(Self {
            session,
            workbook_path,
            last_access: Instant::now(),
            _dir: dir,
        })
    }

    /// Committed (or, before any commit, uploaded) workbook
    pub fn workbook_path(&self) -> &Path {
        &self.workbook_path
    }

    pub fn sink(&self) -> XlsxFileSink {
        XlsxFileSink::new(&self.workbook_path)
    }

    /// Time since the last action on this session
    pub fn idle_for(&self) -> Duration {
        self.last_access.elapsed()
    }
}

/// Lookup failures of the session store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Session store is unavailable")]
    Poisoned,
}

type SharedSlot = Arc<Mutex<SessionSlot>>;

/// Open sessions by id.
///
/// The map lock is only held to look a session up; each session has its own
/// lock, so a slow commit in one session does not block the others.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<Uuid, SharedSlot>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, slot: SessionSlot) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.sessions
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .insert(id, Arc::new(Mutex::new(slot)));
        info!(session = %id, "session opened");
        Ok(id)
    }

    /// Run `f` on one session while holding that session's lock
    pub fn with<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut SessionSlot) -> T,
    ) -> Result<T, StoreError> {
        let key = parse_id(id)?;
        let shared = self
            .sessions
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .get(&key)
            .cloned()
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;

        let mut slot = shared.lock().map_err(|_| StoreError::Poisoned)?;
        slot.last_access = Instant::now();
        Ok(f(&mut slot))
    }

    /// Drop a session and release its temp directory
    pub fn remove(&self, id: &str) -> Result<(), StoreError> {
        let key = parse_id(id)?;
        self.sessions
            .lock()
            .map_err(|_| StoreError::Poisoned)?
            .remove(&key)
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;
        info!(session = %key, "session closed");
        Ok(())
    }

    /// Drop every session idle for at least `ttl`; returns how many went.
    ///
    /// Sessions busy with a request are kept.
    pub fn evict_idle(&self, ttl: Duration) -> Result<usize, StoreError> {
        let mut sessions = self.sessions.lock().map_err(|_| StoreError::Poisoned)?;
        let before = sessions.len();
        sessions.retain(|id, shared| match shared.try_lock() {
            Ok(slot) => {
                let keep = slot.idle_for() < ttl;
                if !keep {
                    info!(session = %id, "session expired after {:?} idle", slot.idle_for());
                }
                keep
            }
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        });
        Ok(before - sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|_| StoreError::UnknownSession(id.to_string()))
}
