//! Durable passport storage backends
//!
//! One record under one fixed location; absence is a valid state. The store
//! layer treats a corrupt record as absence, so backends only move strings.

use std::path::PathBuf;
use std::sync::Mutex;

use eyre::{Context, Result};
use tracing::debug;

/// Durable storage for the serialized passport record
pub trait PassportStorage: Send + Sync {
    /// Read the record; `None` when no record exists
    fn load(&self) -> Result<Option<String>>;

    /// Write the record, replacing any previous one
    fn save(&self, record: &str) -> Result<()>;

    /// Remove the record; removing an absent record is not an error
    fn erase(&self) -> Result<()>;
}

/// File-backed storage at a fixed path
pub struct FilePassportStorage {
    path: PathBuf,
}

impl FilePassportStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PassportStorage for FilePassportStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "load: no passport record");
            return Ok(None);
        }
        let record = std::fs::read_to_string(&self.path)
            .context(format!("Failed to read passport record at {}", self.path.display()))?;
        Ok(Some(record))
    }

    fn save(&self, record: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create storage directory {}", parent.display()))?;
        }
        std::fs::write(&self.path, record)
            .context(format!("Failed to write passport record at {}", self.path.display()))?;
        debug!(path = %self.path.display(), "save: passport record written");
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "erase: passport record removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context(format!("Failed to remove passport record at {}", self.path.display())),
        }
    }
}

/// In-memory storage for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryPassportStorage {
    record: Mutex<Option<String>>,
}

impl MemoryPassportStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the record, as if a previous session had persisted it
    pub fn with_record(record: impl Into<String>) -> Self {
        Self {
            record: Mutex::new(Some(record.into())),
        }
    }
}

impl PassportStorage for MemoryPassportStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.record.lock().expect("storage lock poisoned").clone())
    }

    fn save(&self, record: &str) -> Result<()> {
        *self.record.lock().expect("storage lock poisoned") = Some(record.to_string());
        Ok(())
    }

    fn erase(&self) -> Result<()> {
        *self.record.lock().expect("storage lock poisoned") = None;
        Ok(())
    }
}
