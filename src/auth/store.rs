//! The session store: the single source of truth for authentication state

use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use log::{debug, info, warn};
use tokio::sync::broadcast;

use super::session::{Session, TokenPair};
use crate::error::Error;

/// Persistent key/value backend for the session.
///
/// Calls are synchronous and are made while the store holds its lock, so
/// implementations should be quick. [`FileStorage`] writes a file of a few
/// hundred bytes per call.
pub trait SessionStorage: Send + Sync {
    /// Read the value stored under `key`
    fn load(&self, key: &str) -> Result<Option<String>, Error>;

    /// Store `value` under `key`, replacing any previous value
    fn save(&self, key: &str, value: &str) -> Result<(), Error>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), Error>;
}

/// Storage that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object in a file, one entry per key.
///
/// Writes go to a sibling temp file that is renamed over the original, so a
/// crash never leaves a half-written session behind.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored entries, or `None` when the file can't be parsed
    fn read_all(&self) -> Result<Option<HashMap<String, String>>, Error> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(Some(HashMap::new())),
            Ok(text) => match serde_json::from_str(&text) {
                Ok(entries) => Ok(Some(entries)),
                Err(e) => {
                    warn!("Ignoring unreadable storage file {}: {}", self.path.display(), e);
                    Ok(None)
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Some(HashMap::new())),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), Error> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&serde_json::to_vec_pretty(entries)?)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.and_then(|mut entries| entries.remove(key)))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?.unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.read_all()? {
            Some(mut entries) => {
                if entries.remove(key).is_some() {
                    self.write_all(&entries)?;
                }
            }
            None => self.write_all(&HashMap::new())?,
        }
        Ok(())
    }
}

/// Change notification sent to subscribers of a [`SessionStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { username: String },
    SignedOut,
}

/// Holds the current session and its persisted copy.
///
/// Reads are open to everyone; writes are crate-private and only issued by
/// [`Auth`](super::Auth).
pub struct SessionStore {
    key: String,
    storage: Arc<dyn SessionStorage>,
    current: RwLock<Option<Session>>,
    changes: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a store over `storage`, restoring any valid persisted session
    pub fn new(storage: Arc<dyn SessionStorage>, key: &str) -> Self {
        let (changes, _) = broadcast::channel(16);
        let current = restore(storage.as_ref(), key);
        Self {
            key: key.to_string(),
            storage,
            current: RwLock::new(current),
            changes,
        }
    }

    /// A store that forgets everything when dropped
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()), crate::config::SESSION_STORAGE_KEY)
    }

    /// The current session, if any
    pub fn get(&self) -> Option<Session> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Receive a [`SessionEvent`] for every change of authentication state
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.changes.subscribe()
    }

    /// Replace the session. The persisted copy is written before the new
    /// session becomes visible; if persisting fails nothing changes.
    pub(crate) fn set(&self, session: Session) -> Result<(), Error> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let serialized = serde_json::to_string(session.tokens())?;
        self.storage.save(&self.key, &serialized)?;

        let username = session.username().to_string();
        *current = Some(session);
        drop(current);

        info!("Session established for {}", username);
        let _ = self.changes.send(SessionEvent::SignedIn { username });
        Ok(())
    }

    /// Drop the session and its persisted copy. Clearing an empty store is a
    /// no-op. Returns whether a session was dropped.
    pub(crate) fn clear(&self) -> Result<bool, Error> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        self.clear_locked(&mut current)
    }

    /// Drop the session only while it still carries `access_token`
    pub(crate) fn clear_if(&self, access_token: &str) -> Result<bool, Error> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(session) if session.access_token() == access_token => {
                self.clear_locked(&mut current)
            }
            Some(_) => {
                debug!("Ignoring rejection of a superseded access token");
                Ok(false)
            }
            None => Ok(false),
        }
    }

    fn clear_locked(&self, current: &mut Option<Session>) -> Result<bool, Error> {
        // the in-memory session goes even if the persisted copy can't be removed
        let removed = self.storage.remove(&self.key);
        let dropped = current.take().is_some();
        if dropped {
            info!("Session cleared");
            let _ = self.changes.send(SessionEvent::SignedOut);
        }
        removed.map(|_| dropped)
    }
}

fn restore(storage: &dyn SessionStorage, key: &str) -> Option<Session> {
    let raw = match storage.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            // a backing file that can't be parsed also reads as empty
            if let Err(e) = storage.remove(key) {
                warn!("Could not reset session storage: {}", e);
            }
            return None;
        }
        Err(e) => {
            warn!("Could not read persisted session: {}", e);
            return None;
        }
    };

    let session = serde_json::from_str::<TokenPair>(&raw)
        .map_err(Error::from)
        .and_then(Session::from_tokens);

    match session {
        Ok(session) => {
            debug!("Restored session for {}", session.username());
            Some(session)
        }
        Err(e) => {
            warn!("Discarding invalid persisted session: {}", e);
            if let Err(e) = storage.remove(key) {
                warn!("Could not remove invalid persisted session: {}", e);
            }
            None
        }
    }
}
