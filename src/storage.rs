use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, TimeflowError};
use crate::models::AppState;

/// Well-known key the whole state is stored under.
pub const STORAGE_KEY: &str = "timeflow-tracker-storage";

/// Where application state lives between sessions.
pub trait StateStorage {
    /// Reads the stored state, `None` when nothing has been saved yet.
    fn load(&self) -> Result<Option<AppState>>;
    /// Replaces the stored state.
    fn save(&self, state: &AppState) -> Result<()>;
    /// Forgets everything that was stored.
    fn clear(&self) -> Result<()>;
}

/// Loads the stored state, falling back to the seed state when nothing is
/// stored or the stored copy cannot be read.
pub fn load_or_seed(storage: &dyn StateStorage) -> AppState {
    match storage.load() {
        Ok(Some(state)) => state,
        Ok(None) => {
            debug!("no stored state, starting from seed");
            AppState::seed()
        }
        Err(e) => {
            warn!(error = %e, "stored state unreadable, starting from seed");
            AppState::seed()
        }
    }
}

/// Returns the path to the state file.
///
/// The path is determined in the following order:
/// 1. `TIMEFLOW_DB` environment variable.
/// 2. `~/.local/share/timeflow/timeflow-tracker-storage.json` (on Linux).
/// 3. `./timeflow-tracker-storage.json` (fallback).
pub fn default_state_path() -> PathBuf {
    std::env::var("TIMEFLOW_DB").map(PathBuf::from).unwrap_or_else(|_| {
        let mut p = data_dir();
        p.push(format!("{}.json", STORAGE_KEY));
        p
    })
}

/// File the TUI appends tracing output to: `TIMEFLOW_LOG`, or `timeflow.log`
/// in the data directory.
pub fn log_path() -> PathBuf {
    std::env::var("TIMEFLOW_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| data_dir().join("timeflow.log"))
}

/// Directory holding the state file and the config file.
pub fn data_dir() -> PathBuf {
    let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    p.push("timeflow");
    p
}

/// State kept as one pretty-printed JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStorage { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| STORAGE_KEY.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<AppState>> {
        let mut f = match OpenOptions::new().read(true).open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TimeflowError::persistence(&self.path, e)),
        };
        let mut s = String::new();
        f.read_to_string(&mut s)
            .map_err(|e| TimeflowError::persistence(&self.path, e))?;
        let state = serde_json::from_str(&s)?;
        debug!(path = %self.path.display(), "state loaded");
        Ok(Some(state))
    }

    /// Writes to a sibling temporary file, then renames it over the target so
    /// readers never see a half-written document.
    fn save(&self, state: &AppState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TimeflowError::persistence(parent, e))?;
        }
        let s = serde_json::to_string_pretty(state)?;
        let tmp = self.temp_path();
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .map_err(|e| TimeflowError::persistence(&tmp, e))?;
        f.write_all(s.as_bytes())
            .and_then(|_| f.sync_all())
            .map_err(|e| TimeflowError::persistence(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| TimeflowError::persistence(&self.path, e))?;
        debug!(path = %self.path.display(), "state saved");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TimeflowError::persistence(&self.path, e)),
        }
    }
}

/// Keeps the serialized state in memory; useful for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: RefCell<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with a raw document, which need not be valid.
    pub fn with_document(document: impl Into<String>) -> Self {
        MemoryStorage {
            document: RefCell::new(Some(document.into())),
        }
    }

    pub fn document(&self) -> Option<String> {
        self.document.borrow().clone()
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<AppState>> {
        match self.document.borrow().as_deref() {
            Some(s) => Ok(Some(serde_json::from_str(s)?)),
            None => Ok(None),
        }
    }

    fn save(&self, state: &AppState) -> Result<()> {
        *self.document.borrow_mut() = Some(serde_json::to_string(state)?);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.document.borrow_mut() = None;
        Ok(())
    }
}
