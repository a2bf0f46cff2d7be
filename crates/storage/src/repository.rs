use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use drill_core::model::{ProgressEntry, ProgressError, ProgressRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("cannot read trainfile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write trainfile {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt trainfile {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("trainfile {path} has unsupported version {found}")]
    UnsupportedVersion { path: PathBuf, found: u32 },

    /// A thread panicked while holding in-memory repository state.
    #[error("repository state poisoned: {0}")]
    Poisoned(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of a progress entry.
///
/// Mirrors the domain `ProgressEntry` so the file schema can evolve without
/// leaking serde into the domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgressEntryRecord {
    pub times_asked: u32,
    pub times_correct: u32,
    #[serde(default)]
    pub last_asked_at: Option<DateTime<Utc>>,
}

impl ProgressEntryRecord {
    #[must_use]
    pub fn from_entry(entry: &ProgressEntry) -> Self {
        Self {
            times_asked: entry.times_asked(),
            times_correct: entry.times_correct(),
            last_asked_at: entry.last_asked_at(),
        }
    }

    /// Convert the record back into a domain entry.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the counters violate `times_correct <= times_asked`.
    pub fn into_entry(self) -> Result<ProgressEntry, ProgressError> {
        ProgressEntry::from_persisted(self.times_asked, self.times_correct, self.last_asked_at)
    }
}

/// Repository contract for a learner's progress record.
pub trait ProgressRepository: Send {
    /// Load the stored record; a record that was never saved loads as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if stored data is unreadable or corrupt.
    fn load_progress(&self) -> Result<ProgressRecord, StorageError>;

    /// Replace the stored record with `record`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be written.
    fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError>;
}

/// In-memory repository for tests and for sessions that keep no history.
#[derive(Clone, Default)]
pub struct InMemoryProgressRepository {
    record: Arc<Mutex<Option<ProgressRecord>>>,
    saves: Arc<Mutex<usize>>,
}

impl InMemoryProgressRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(record: ProgressRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(Some(record))),
            saves: Arc::default(),
        }
    }

    /// Last saved (or seeded) record, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<ProgressRecord> {
        self.record.lock().ok().and_then(|guard| guard.clone())
    }

    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|guard| *guard).unwrap_or_default()
    }
}

impl ProgressRepository for InMemoryProgressRepository {
    fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
        let guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        Ok(guard.clone().unwrap_or_default())
    }

    fn save_progress(&self, record: &ProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .record
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        *guard = Some(record.clone());
        let mut saves = self
            .saves
            .lock()
            .map_err(|e| StorageError::Poisoned(e.to_string()))?;
        *saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::FactId;
    use drill_core::time::fixed_now;

    #[test]
    fn in_memory_round_trips_record() {
        let repo = InMemoryProgressRepository::new();
        assert!(repo.load_progress().unwrap().is_empty());

        let mut record = ProgressRecord::new();
        record.record(&FactId::new("DL").unwrap(), true, fixed_now());
        repo.save_progress(&record).unwrap();

        assert_eq!(repo.load_progress().unwrap(), record);
        assert_eq!(repo.save_count(), 1);
    }

    #[test]
    fn entry_record_rejects_inconsistent_counts() {
        let record = ProgressEntryRecord {
            times_asked: 1,
            times_correct: 2,
            last_asked_at: None,
        };
        assert!(record.into_entry().is_err());
    }

    #[test]
    fn poisoned_state_is_reported() {
        let repo = InMemoryProgressRepository::new();
        let shared = repo.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.record.lock().unwrap();
            panic!("panic while holding the record");
        })
        .join();

        assert!(matches!(repo.load_progress(), Err(StorageError::Poisoned(_))));
        assert!(matches!(
            repo.save_progress(&ProgressRecord::new()),
            Err(StorageError::Poisoned(_))
        ));
    }

    #[test]
    fn repository_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<InMemoryProgressRepository>();
    }
}
